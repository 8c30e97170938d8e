//! Ledgerfolio Core - Ledger normalization, lot accounting and valuation.
//!
//! This crate turns raw ledger rows into positions, values them against
//! live and historical quotes, and derives the range, real-asset and
//! net-worth views. Quote fetching lives in the `market-data` crate.

pub mod assets;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod operations;
pub mod portfolio;
pub mod settings;
pub mod utils;

// Re-export common types from asset and portfolio modules
pub use assets::*;
pub use portfolio::*;

pub use engine::{Dashboard, PortfolioEngine};
pub use ledger::{LedgerSource, TieredLedgerLoader};
pub use settings::EngineSettings;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
