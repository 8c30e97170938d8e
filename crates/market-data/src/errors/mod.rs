//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all quote and history operations
//! - [`RetryClass`]: Classification for determining fallback behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching quotes or historical series.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which the registries use to decide
/// whether the next tier should be tried.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The symbol is unknown to the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider cannot map this asset to one of its symbols.
    #[error("Resolution failed for provider: {provider}")]
    ResolutionFailed { provider: String },

    /// The provider returned no points for the requested range.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider returned a price that is non-positive or non-finite.
    #[error("Price unavailable for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    /// HTTP 429 or quota exhaustion.
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Any other provider-specific failure.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider's circuit is open.
    #[error("Circuit open: {provider}")]
    CircuitOpen { provider: String },

    /// No registered provider supports the instrument class.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// Every tier was tried and all failed.
    #[error("All providers failed")]
    AllProvidersFailed,

    /// Local history file could not be read or parsed.
    #[error("History file error: {0}")]
    HistoryFile(String),

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// ```
    /// use ledgerfolio_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "FINNHUB".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::NoProvidersAvailable | Self::AllProvidersFailed => RetryClass::Never,

            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network(_) => {
                RetryClass::FailoverWithPenalty
            }

            // An unknown symbol or an unusable price on one tier says nothing
            // about the next tier, which uses its own symbol scheme.
            Self::SymbolNotFound(_)
            | Self::ResolutionFailed { .. }
            | Self::NoDataForRange
            | Self::PriceUnavailable { .. }
            | Self::ProviderError { .. }
            | Self::HistoryFile(_) => RetryClass::NextProvider,

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }
}
