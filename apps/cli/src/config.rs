use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ledgerfolio_core::portfolio::PnlRange;
use ledgerfolio_core::settings::EngineSettings;
use rust_decimal::Decimal;

const DEFAULT_SNAPSHOT_PATH: &str = "./data/ledger-snapshot.json";
const DEFAULT_TABLE_NAME: &str = "Operations";

/// Credentials and location of the Airtable ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table_name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` disables the Finnhub quote and history tier.
    pub finnhub_key: Option<String>,
    /// `None` disables the live ledger tier.
    pub airtable: Option<AirtableConfig>,
    pub snapshot_path: PathBuf,
    pub history_dir: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub refresh_secs: Option<u64>,
    pub settings: EngineSettings,
}

impl Config {
    pub fn from_env() -> Self {
        // A missing .env file is fine; the process environment still applies.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset and
    /// unparseable numbers fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let airtable = match (var("AIRTABLE_API_KEY"), var("AIRTABLE_BASE_ID")) {
            (Some(api_key), Some(base_id)) => Some(AirtableConfig {
                api_key,
                base_id,
                table_name: var("AIRTABLE_TABLE_NAME")
                    .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            }),
            _ => None,
        };

        let mut settings = EngineSettings::default();
        if let Some(window) = var("LEDGERFOLIO_WINDOW").and_then(|v| PnlRange::from_str(&v).ok()) {
            settings.window = window;
        }
        if let Some(concurrency) = var("LEDGERFOLIO_CONCURRENCY").and_then(|v| v.parse().ok()) {
            settings.concurrency = concurrency;
        }
        if let Some(milestone) =
            var("LEDGERFOLIO_MILESTONE").and_then(|v| Decimal::from_str(&v).ok())
        {
            settings.wealth_milestone = milestone;
        }

        Self {
            finnhub_key: var("FINNHUB_KEY"),
            airtable,
            snapshot_path: var("LEDGERFOLIO_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            history_dir: var("LEDGERFOLIO_HISTORY_DIR").map(PathBuf::from),
            csv_path: var("LEDGERFOLIO_CSV_PATH").map(PathBuf::from),
            refresh_secs: var("LEDGERFOLIO_REFRESH_SECS").and_then(|v| v.parse().ok()),
            settings,
        }
    }

    /// Refresh interval of the watch loop; `None` or zero runs once.
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
