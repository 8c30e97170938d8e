//! Yahoo Finance provider.
//!
//! Generic equity tier: daily history for equities and crypto (`BTC-USD`),
//! and an alternate snapshot quote for equities.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{InstrumentClass, PricePoint, QuoteContext, QuoteSnapshot};
use crate::provider::{HistoryProvider, QuoteProvider};
use crate::resolver::yahoo_symbol;

const PROVIDER_ID: &str = "YAHOO";

/// Yahoo Finance provider backed by `yahoo_finance_api`.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
}

impl YahooProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        Ok(Self { connector })
    }

    /// Convert chrono DateTime<Utc> to time::OffsetDateTime for the Yahoo API.
    fn chrono_to_offset_datetime(dt: DateTime<Utc>) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(dt.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    fn map_error(symbol: &str, e: yahoo::YahooError) -> MarketDataError {
        if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
            MarketDataError::SymbolNotFound(symbol.to_string())
        } else {
            MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            }
        }
    }
}

fn to_point(quote: &yahoo::Quote) -> Option<PricePoint> {
    let timestamp = Utc.timestamp_opt(quote.timestamp as i64, 0).single()?;
    let close = Decimal::from_f64_retain(quote.close).filter(|c| *c > Decimal::ZERO)?;
    Some(PricePoint { timestamp, close })
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        8
    }

    fn supports(&self, class: InstrumentClass) -> bool {
        class == InstrumentClass::Equity
    }

    async fn get_latest_quote(
        &self,
        context: &QuoteContext,
    ) -> Result<QuoteSnapshot, MarketDataError> {
        let symbol = yahoo_symbol(&context.symbol, context.class);
        let response = self
            .connector
            .get_latest_quotes(&symbol, "1d")
            .await
            .map_err(|e| Self::map_error(&symbol, e))?;

        let quotes = response.quotes().map_err(|e| Self::map_error(&symbol, e))?;
        let mut points = quotes.iter().filter_map(to_point).collect::<Vec<_>>();
        points.sort_by_key(|p| p.timestamp);

        let last = points
            .pop()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.clone()))?;
        let previous_close = points.last().map(|p| p.close);

        Ok(QuoteSnapshot {
            symbol: context.symbol.clone(),
            price: last.close,
            previous_close,
            timestamp: last.timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, _class: InstrumentClass) -> bool {
        true
    }

    async fn get_history(
        &self,
        context: &QuoteContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let symbol = yahoo_symbol(&context.symbol, context.class);
        debug!(
            "Fetching Yahoo history for '{}' from {} to {}",
            symbol,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let response = self
            .connector
            .get_quote_history(
                &symbol,
                Self::chrono_to_offset_datetime(start),
                Self::chrono_to_offset_datetime(end),
            )
            .await
            .map_err(|e| Self::map_error(&symbol, e))?;

        match response.quotes() {
            Ok(quotes) => {
                let points: Vec<PricePoint> = quotes.iter().filter_map(to_point).collect();
                if points.is_empty() {
                    return Err(MarketDataError::NoDataForRange);
                }
                Ok(points)
            }
            Err(yahoo::YahooError::NoQuotes) => {
                warn!("No historical quotes returned for '{}'", symbol);
                Err(MarketDataError::NoDataForRange)
            }
            Err(e) => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_chrono_conversion_keeps_seconds() {
        let now = Utc::now();
        let converted = YahooProvider::chrono_to_offset_datetime(now);
        assert_eq!(converted.unix_timestamp(), now.timestamp());

        let earlier = now - Duration::days(30);
        assert!(YahooProvider::chrono_to_offset_datetime(earlier) < converted);
    }

    #[test]
    fn test_no_quotes_maps_to_symbol_not_found() {
        let err = YahooProvider::map_error("ZZZZ", yahoo::YahooError::NoQuotes);
        assert!(matches!(err, MarketDataError::SymbolNotFound(s) if s == "ZZZZ"));
    }
}
