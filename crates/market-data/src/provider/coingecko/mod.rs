//! CoinGecko provider.
//!
//! Alternate tier for crypto: snapshot quotes via /simple/price and history
//! via /coins/{id}/market_chart/range. Coin ids come from a built-in table
//! and fall back to a one-time /coins/list lookup.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{InstrumentClass, PricePoint, QuoteContext, QuoteSnapshot};
use crate::provider::{HistoryProvider, QuoteProvider};
use crate::resolver::{coingecko_id, crypto_base_ticker};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";
const VS_CURRENCY: &str = "usd";

#[derive(Debug, Deserialize)]
struct CoinListEntry {
    id: String,
    symbol: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    /// Lowercase symbol/id/name -> coin id, loaded on first miss.
    coin_index: OnceCell<HashMap<String, String>>,
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            coin_index: OnceCell::new(),
        }
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("CoinGecko request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
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
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        Ok(response.text().await?)
    }

    /// Resolves the coin id for a crypto symbol.
    async fn resolve_coin_id(&self, symbol: &str) -> Result<String, MarketDataError> {
        if let Some(id) = coingecko_id(symbol) {
            return Ok(id.to_string());
        }

        let index = self
            .coin_index
            .get_or_try_init(|| async {
                let text = self.fetch("/coins/list", &[]).await?;
                parse_coin_list(&text)
            })
            .await?;

        let base = crypto_base_ticker(symbol).to_lowercase();
        index
            .get(&base)
            .cloned()
            .ok_or_else(|| MarketDataError::ResolutionFailed {
                provider: PROVIDER_ID.to_string(),
            })
    }
}

/// Builds the lookup index; the first coin listed for a symbol wins.
fn parse_coin_list(text: &str) -> Result<HashMap<String, String>, MarketDataError> {
    let coins: Vec<CoinListEntry> =
        serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse coin list: {}", e),
        })?;

    let mut index = HashMap::with_capacity(coins.len() * 2);
    for coin in coins {
        for key in [&coin.symbol, &coin.id, &coin.name] {
            index
                .entry(key.to_lowercase())
                .or_insert_with(|| coin.id.clone());
        }
    }
    Ok(index)
}

fn parse_simple_price(
    symbol: &str,
    coin_id: &str,
    text: &str,
) -> Result<QuoteSnapshot, MarketDataError> {
    let body: HashMap<String, SimplePriceEntry> =
        serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse price response: {}", e),
        })?;

    let entry = body
        .get(coin_id)
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
    let raw = entry
        .usd
        .ok_or_else(|| MarketDataError::PriceUnavailable {
            symbol: symbol.to_string(),
            reason: "missing usd price".to_string(),
        })?;
    let price = Decimal::try_from(raw).map_err(|_| MarketDataError::PriceUnavailable {
        symbol: symbol.to_string(),
        reason: format!("unrepresentable price {}", raw),
    })?;

    // Derive the close 24h ago from the reported percentage change.
    let previous_close = entry
        .usd_24h_change
        .and_then(|pct| Decimal::try_from(pct).ok())
        .map(|pct| Decimal::ONE + pct / Decimal::ONE_HUNDRED)
        .filter(|factor| *factor > Decimal::ZERO)
        .and_then(|factor| price.checked_div(factor))
        .filter(|pc| *pc > Decimal::ZERO);

    Ok(QuoteSnapshot {
        symbol: symbol.to_string(),
        price,
        previous_close,
        timestamp: Utc::now(),
        source: PROVIDER_ID.to_string(),
    })
}

fn parse_market_chart(text: &str) -> Result<Vec<PricePoint>, MarketDataError> {
    let chart: MarketChartResponse =
        serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse market chart: {}", e),
        })?;

    let points: Vec<PricePoint> = chart
        .prices
        .into_iter()
        .filter_map(|(ms, price)| {
            let timestamp = Utc.timestamp_millis_opt(ms as i64).single()?;
            let close = Decimal::try_from(price).ok().filter(|p| *p > Decimal::ZERO);
            if close.is_none() {
                warn!("Skipping invalid CoinGecko price {} at {}", price, ms);
            }
            Some(PricePoint {
                timestamp,
                close: close?,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(MarketDataError::NoDataForRange);
    }
    Ok(points)
}

#[async_trait]
impl QuoteProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        5
    }

    fn supports(&self, class: InstrumentClass) -> bool {
        class == InstrumentClass::Crypto
    }

    async fn get_latest_quote(
        &self,
        context: &QuoteContext,
    ) -> Result<QuoteSnapshot, MarketDataError> {
        let coin_id = self.resolve_coin_id(&context.symbol).await?;
        let text = self
            .fetch(
                "/simple/price",
                &[
                    ("ids", coin_id.as_str()),
                    ("vs_currencies", VS_CURRENCY),
                    ("include_24hr_change", "true"),
                ],
            )
            .await?;
        parse_simple_price(&context.symbol, &coin_id, &text)
    }
}

#[async_trait]
impl HistoryProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, class: InstrumentClass) -> bool {
        class == InstrumentClass::Crypto
    }

    async fn get_history(
        &self,
        context: &QuoteContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let coin_id = self.resolve_coin_id(&context.symbol).await?;
        let endpoint = format!("/coins/{}/market_chart/range", urlencoding::encode(&coin_id));
        let from_ts = start.timestamp().to_string();
        let to_ts = end.timestamp().to_string();
        let text = self
            .fetch(
                &endpoint,
                &[
                    ("vs_currency", VS_CURRENCY),
                    ("from", from_ts.as_str()),
                    ("to", to_ts.as_str()),
                ],
            )
            .await?;
        parse_market_chart(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_simple_price_derives_previous_close() {
        let body = r#"{"bitcoin":{"usd":110.0,"usd_24h_change":10.0}}"#;
        let quote = parse_simple_price("BINANCE:BTCUSDT", "bitcoin", body).unwrap();
        assert_eq!(quote.price, dec!(110));
        assert_eq!(quote.previous_close, Some(dec!(100)));
        assert_eq!(quote.source, "COINGECKO");
    }

    #[test]
    fn test_parse_simple_price_missing_coin() {
        let err = parse_simple_price("BINANCE:XYZUSDT", "xyz", "{}").unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[test]
    fn test_parse_market_chart() {
        let body = r#"{"prices":[[1700000000000,30000.5],[1700086400000,-1.0],[1700172800000,31000.0]]}"#;
        let points = parse_market_chart(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(30000.5));
        assert_eq!(points[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_coin_list_first_symbol_wins() {
        let body = r#"[
            {"id":"pepe","symbol":"pepe","name":"Pepe"},
            {"id":"pepe-fork","symbol":"pepe","name":"Pepe Fork"}
        ]"#;
        let index = parse_coin_list(body).unwrap();
        assert_eq!(index.get("pepe").map(String::as_str), Some("pepe"));
        assert_eq!(index.get("pepe fork").map(String::as_str), Some("pepe-fork"));
    }

    #[test]
    fn test_supports_crypto_only() {
        let provider = CoinGeckoProvider::new();
        assert!(QuoteProvider::supports(&provider, InstrumentClass::Crypto));
        assert!(!QuoteProvider::supports(&provider, InstrumentClass::Equity));
    }
}
