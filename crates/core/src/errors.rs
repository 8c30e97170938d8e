//! Core error types for the Ledgerfolio engine.
//!
//! Nothing in the valuation path is fatal: bad rows are discarded, missing
//! prices fall back, and oversells are absorbed. These types surface at the
//! boundaries (ledger loading, snapshot files, exports).

use thiserror::Error;

pub use ledgerfolio_market_data::errors::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Validation errors for raw ledger fields.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while loading ledger records.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Ledger source '{0}' returned no records")]
    Empty(String),

    #[error("Snapshot file not found: {0}")]
    SnapshotMissing(String),

    #[error("All ledger sources failed")]
    AllSourcesFailed,
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Export(err.to_string())
    }
}
