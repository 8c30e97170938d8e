//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` and `HistoryProvider` traits
//! - Concrete providers: Finnhub (primary), CoinGecko (crypto),
//!   Yahoo (generic equity), and local historic CSV files
//!
//! Providers receive a `QuoteContext` carrying the primary symbol. Providers
//! with their own symbol scheme derive it through the resolver module.

mod traits;

pub mod coingecko;
pub mod finnhub;
pub mod historic_csv;
pub mod yahoo;

pub use traits::{HistoryProvider, QuoteProvider};
