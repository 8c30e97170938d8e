use std::fs;
use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ledgerfolio_core::engine::{Dashboard, PortfolioEngine};
use ledgerfolio_core::ledger::{
    DemoSource, LedgerMeta, LedgerSource, LedgerTier, SnapshotStore, TieredLedgerLoader,
};
use ledgerfolio_market_data::{
    CircuitBreaker, CoinGeckoProvider, FinnhubProvider, HistoricCsvProvider, HistoryProvider,
    HistoryRegistry, QuoteProvider, QuoteRegistry, YahooProvider,
};

use crate::airtable::AirtableSource;
use crate::config::Config;

pub fn init_tracing() {
    let log_format =
        std::env::var("LEDGERFOLIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Ledger tiers: Airtable when configured, then the snapshot file, then the
/// demo rows.
pub fn build_loader(config: &Config) -> TieredLedgerLoader {
    let mut sources: Vec<Arc<dyn LedgerSource>> = Vec::new();
    match &config.airtable {
        Some(airtable) => sources.push(Arc::new(AirtableSource::new(airtable))),
        None => tracing::warn!("Airtable credentials missing, live ledger tier disabled"),
    }
    sources.push(Arc::new(SnapshotStore::new(config.snapshot_path.clone())));
    sources.push(Arc::new(DemoSource));
    TieredLedgerLoader::new(sources)
}

pub fn build_engine(config: &Config) -> anyhow::Result<PortfolioEngine> {
    let breaker = Arc::new(CircuitBreaker::new());
    let yahoo = Arc::new(YahooProvider::new()?);
    let coingecko = Arc::new(CoinGeckoProvider::new());

    let mut quote_providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
    let mut history_tiers: Vec<Arc<dyn HistoryProvider>> = Vec::new();

    match &config.finnhub_key {
        Some(key) => {
            let finnhub = Arc::new(FinnhubProvider::new(key.clone()));
            quote_providers.push(finnhub.clone());
            history_tiers.push(finnhub);
        }
        None => tracing::warn!("FINNHUB_KEY not set, Finnhub tier disabled"),
    }
    quote_providers.push(coingecko.clone());
    quote_providers.push(yahoo.clone());
    history_tiers.push(coingecko);
    history_tiers.push(yahoo);
    if let Some(dir) = &config.history_dir {
        history_tiers.push(Arc::new(HistoricCsvProvider::new(dir.clone())));
    }

    let quotes = QuoteRegistry::new(quote_providers, breaker.clone());
    tracing::info!("Quote providers: {:?}", quotes.provider_ids());
    let history = HistoryRegistry::new(history_tiers, breaker);

    Ok(PortfolioEngine::new(config.settings.clone())
        .with_quote_registry(Arc::new(quotes))
        .with_history_registry(Arc::new(history)))
}

/// Loads the ledger into the engine. A live load also refreshes the snapshot
/// file so the next run has a cached tier.
pub async fn load_ledger(
    engine: &mut PortfolioEngine,
    loader: &TieredLedgerLoader,
    config: &Config,
) -> anyhow::Result<LedgerMeta> {
    let load = loader.load().await?;
    let meta = load.meta();
    if load.tier == LedgerTier::Live {
        if let Err(e) = SnapshotStore::new(config.snapshot_path.clone()).save(&load.records) {
            tracing::warn!("Failed to write ledger snapshot: {}", e);
        }
    }
    engine.load_records(&load.records, Some(meta.clone()));
    Ok(meta)
}

/// Prints the dashboard as JSON and writes the CSV export when configured.
pub fn write_outputs(
    engine: &PortfolioEngine,
    dashboard: &Dashboard,
    config: &Config,
) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(dashboard)?);

    let unavailable = engine.unavailable_quotes();
    if !unavailable.is_empty() {
        tracing::warn!("No live price for: {}", unavailable.join(", "));
    }

    if let Some(path) = &config.csv_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, engine.export_csv()?)?;
        tracing::info!("Positions exported to {}", path.display());
    }

    let milestone = engine.net_worth_timeline(Utc::now()).milestone;
    let outlook = match milestone.date {
        Some(date) if milestone.already_reached => format!("reached on {}", date.date_naive()),
        Some(date) => format!("expected around {}", date.date_naive()),
        None => "not reached within the projection horizon".to_string(),
    };
    tracing::info!("Milestone {} {}", milestone.target, outlook);
    Ok(())
}
