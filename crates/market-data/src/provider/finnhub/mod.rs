//! Finnhub market data provider implementation.
//!
//! This module provides market data from Finnhub API:
//! - Equities and crypto snapshot quotes via /quote
//! - Equity history via /stock/candle
//! - Crypto history via /crypto/candle
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{InstrumentClass, PricePoint, QuoteContext, QuoteSnapshot};
use crate::provider::{HistoryProvider, QuoteProvider};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
}

/// Response from /stock/candle and /crypto/candle endpoints
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Close prices
    #[serde(default)]
    c: Vec<f64>,
    /// Timestamps (Unix)
    #[serde(default)]
    t: Vec<i64>,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
///
/// Primary tier for both snapshot quotes and history. Uses the primary symbol
/// scheme as-is (`AAPL`, `XETRA:SAP`, `BINANCE:BTCUSDT`).
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL.to_string())
    }

    /// Create a provider pointed at a different host (used by tests).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();

        // 403 is how Finnhub reports an exhausted quota
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(ErrorResponse { error: Some(message) }) =
                serde_json::from_str::<ErrorResponse>(&body)
            {
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message,
                });
            }

            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }

    fn candle_endpoint(class: InstrumentClass) -> &'static str {
        match class {
            InstrumentClass::Equity => "/stock/candle",
            InstrumentClass::Crypto => "/crypto/candle",
        }
    }
}

/// Parses a /quote body. Finnhub answers unknown symbols with zeros.
fn parse_quote(symbol: &str, text: &str) -> Result<QuoteSnapshot, MarketDataError> {
    let response: QuoteResponse =
        serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse quote response: {}", e),
        })?;

    let close = response
        .c
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    if close == 0.0 && response.pc.unwrap_or(0.0) == 0.0 {
        return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
    }

    let price = Decimal::try_from(close).map_err(|_| MarketDataError::PriceUnavailable {
        symbol: symbol.to_string(),
        reason: format!("unrepresentable price {}", close),
    })?;

    let timestamp = response
        .t
        .filter(|ts| *ts > 0)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    Ok(QuoteSnapshot {
        symbol: symbol.to_string(),
        price,
        previous_close: response
            .pc
            .and_then(|v| Decimal::try_from(v).ok())
            .filter(|pc| *pc > Decimal::ZERO),
        timestamp,
        source: PROVIDER_ID.to_string(),
    })
}

/// Parses a candle body into close points, skipping malformed entries.
fn parse_candles(text: &str) -> Result<Vec<PricePoint>, MarketDataError> {
    let response: CandleResponse =
        serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse candle response: {}", e),
        })?;

    if response.s == "no_data" {
        return Err(MarketDataError::NoDataForRange);
    }

    if response.s != "ok" {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Unexpected candle status: {}", response.s),
        });
    }

    if response.c.len() != response.t.len() {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: "Mismatched array lengths in candle response".to_string(),
        });
    }

    let mut points = Vec::with_capacity(response.t.len());
    for (ts, close) in response.t.iter().zip(response.c.iter()) {
        let Some(timestamp) = Utc.timestamp_opt(*ts, 0).single() else {
            warn!("Invalid candle timestamp: {}", ts);
            continue;
        };
        match Decimal::try_from(*close) {
            Ok(close) if close > Decimal::ZERO => points.push(PricePoint { timestamp, close }),
            _ => warn!("Invalid candle close at {}: {}", ts, close),
        }
    }

    if points.is_empty() {
        return Err(MarketDataError::NoDataForRange);
    }
    Ok(points)
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn supports(&self, _class: InstrumentClass) -> bool {
        true
    }

    async fn get_latest_quote(
        &self,
        context: &QuoteContext,
    ) -> Result<QuoteSnapshot, MarketDataError> {
        let text = self
            .fetch("/quote", &[("symbol", context.symbol.as_str())])
            .await?;
        parse_quote(&context.symbol, &text)
    }
}

#[async_trait]
impl HistoryProvider for FinnhubProvider {
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
        let from_ts = start.timestamp().to_string();
        let to_ts = end.timestamp().to_string();
        let params = [
            ("symbol", context.symbol.as_str()),
            ("resolution", "D"),
            ("from", from_ts.as_str()),
            ("to", to_ts.as_str()),
        ];

        let text = self
            .fetch(Self::candle_endpoint(context.class), &params)
            .await?;
        parse_candles(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id_and_priority() {
        let provider = FinnhubProvider::new("test_key".to_string());
        assert_eq!(QuoteProvider::id(&provider), "FINNHUB");
        assert_eq!(provider.priority(), 1);
        assert!(QuoteProvider::supports(&provider, InstrumentClass::Crypto));
    }

    #[test]
    fn test_parse_quote_with_previous_close() {
        let quote = parse_quote("AAPL", r#"{"c":189.5,"pc":187.25,"t":1700000000}"#).unwrap();
        assert_eq!(quote.price, dec!(189.5));
        assert_eq!(quote.previous_close, Some(dec!(187.25)));
        assert_eq!(quote.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(quote.source, "FINNHUB");
    }

    #[test]
    fn test_parse_quote_unknown_symbol() {
        let err = parse_quote("NOPE", r#"{"c":0,"pc":0,"t":0}"#).unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[test]
    fn test_parse_candles() {
        let body = r#"{"s":"ok","c":[10.0,11.5,0.0],"t":[1700000000,1700086400,1700172800]}"#;
        let points = parse_candles(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].close, dec!(11.5));
    }

    #[test]
    fn test_parse_candles_no_data() {
        let err = parse_candles(r#"{"s":"no_data"}"#).unwrap_err();
        assert!(matches!(err, MarketDataError::NoDataForRange));
    }

    #[test]
    fn test_candle_endpoint_by_class() {
        assert_eq!(
            FinnhubProvider::candle_endpoint(InstrumentClass::Crypto),
            "/crypto/candle"
        );
        assert_eq!(
            FinnhubProvider::candle_endpoint(InstrumentClass::Equity),
            "/stock/candle"
        );
    }
}
