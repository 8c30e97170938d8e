//! Local historic price files.
//!
//! Reads the files written by the price downloader:
//! `historic-<ticker>-<currency>-<id>.csv`, one header line, then rows of
//! `"""YYYY-MM-DD""",<price>`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{InstrumentClass, PricePoint, QuoteContext};
use crate::provider::HistoryProvider;
use crate::resolver::crypto_base_ticker;

const PROVIDER_ID: &str = "HISTORIC_CSV";

/// History tier backed by a directory of downloaded CSV files.
pub struct HistoricCsvProvider {
    dir: PathBuf,
}

impl HistoricCsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ticker part of the file name for a context.
    fn file_ticker(context: &QuoteContext) -> String {
        match context.class {
            InstrumentClass::Crypto => crypto_base_ticker(&context.symbol).to_lowercase(),
            InstrumentClass::Equity => context
                .symbol
                .rsplit(':')
                .next()
                .unwrap_or(&context.symbol)
                .to_lowercase(),
        }
    }

    /// First file in the directory whose name starts with `historic-<ticker>-`.
    fn find_file(&self, ticker: &str) -> Result<PathBuf, MarketDataError> {
        let prefix = format!("historic-{}-", ticker);
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            MarketDataError::HistoryFile(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.to_lowercase())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".csv"))
            })
            .collect();
        matches.sort();

        matches
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::SymbolNotFound(ticker.to_string()))
    }
}

/// Parses one downloader file. Rows that do not parse are skipped.
pub fn read_history_file(path: &Path) -> Result<Vec<PricePoint>, MarketDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| MarketDataError::HistoryFile(format!("{}: {}", path.display(), e)))?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };
        let (Some(raw_date), Some(raw_price)) = (record.get(0), record.get(1)) else {
            continue;
        };

        let date = NaiveDate::parse_from_str(raw_date.trim().trim_matches('"'), "%Y-%m-%d");
        let price = raw_price.trim().parse::<Decimal>().ok().or_else(|| {
            raw_price
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|v| Decimal::try_from(v).ok())
        });

        match (date, price) {
            (Ok(date), Some(close)) if close > Decimal::ZERO => {
                if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                    points.push(PricePoint {
                        timestamp: Utc.from_utc_datetime(&naive),
                        close,
                    });
                }
            }
            _ => debug!("Skipping row {:?} in {}", record, path.display()),
        }
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

#[async_trait]
impl HistoryProvider for HistoricCsvProvider {
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
        let path = self.find_file(&Self::file_ticker(context))?;
        let points: Vec<PricePoint> = read_history_file(&path)?
            .into_iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .collect();

        if points.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }
        Ok(points)
    }
}
