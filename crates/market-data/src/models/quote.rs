use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::InstrumentClass;

/// Request context for quote and history fetching.
///
/// `symbol` is the primary provider symbol produced by the symbol mapper
/// (e.g. `AAPL`, `BINANCE:BTCUSDT`). Providers with a different symbol
/// scheme derive their own symbol from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuoteContext {
    /// Ledger asset key the request was made for.
    pub asset_key: String,
    /// Primary provider symbol.
    pub symbol: String,
    pub class: InstrumentClass,
}

impl QuoteContext {
    pub fn new(asset_key: impl Into<String>, symbol: impl Into<String>, class: InstrumentClass) -> Self {
        Self {
            asset_key: asset_key.into(),
            symbol: symbol.into(),
            class,
        }
    }
}

/// Latest price for a symbol, from a stream tick or a snapshot request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub symbol: String,

    /// Last traded price. Always positive once validated.
    pub price: Decimal,

    /// Previous session close, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    pub timestamp: DateTime<Utc>,

    /// Source of the quote (STREAM, FINNHUB, COINGECKO, ...)
    pub source: String,
}

impl QuoteSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        previous_close: Option<Decimal>,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            previous_close,
            timestamp,
            source: source.into(),
        }
    }
}
