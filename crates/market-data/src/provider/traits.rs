//! Provider trait definitions.
//!
//! Quote and history are separate seams: a tier may serve one without the
//! other (the local CSV files only have history, the stream only has quotes).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketDataError;
use crate::models::{InstrumentClass, PricePoint, QuoteContext, QuoteSnapshot};

/// Snapshot quote source.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use ledgerfolio_market_data::provider::QuoteProvider;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn supports(&self, class: InstrumentClass) -> bool {
///         class == InstrumentClass::Equity
///     }
///
///     // ... implement get_latest_quote
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier, used for logging, circuit breaker tracking, and
    /// the `source` of returned quotes.
    fn id(&self) -> &'static str;

    /// Lower values are tried first. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Whether this provider can quote the instrument class at all.
    fn supports(&self, class: InstrumentClass) -> bool;

    /// Fetch the latest quote.
    ///
    /// Implementations return the raw provider price; the registry validates
    /// it before handing it out.
    async fn get_latest_quote(
        &self,
        context: &QuoteContext,
    ) -> Result<QuoteSnapshot, MarketDataError>;
}

/// Historical close series source.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    fn id(&self) -> &'static str;

    fn supports(&self, class: InstrumentClass) -> bool;

    /// Fetch daily closes in `[start, end]`, ordered by timestamp ascending.
    async fn get_history(
        &self,
        context: &QuoteContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MarketDataError>;
}
