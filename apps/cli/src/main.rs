mod airtable;
mod config;
mod main_lib;
mod scheduler;

use chrono::Utc;
use config::Config;
use main_lib::{build_engine, build_loader, init_tracing, load_ledger, write_outputs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();

    let mut engine = build_engine(&config)?;
    let loader = build_loader(&config);
    let meta = load_ledger(&mut engine, &loader, &config).await?;
    tracing::info!(
        "Ledger loaded from {} ({} tier, {} rows)",
        meta.source_name,
        meta.tier,
        meta.count
    );

    engine.preload_quotes().await;
    let as_of = Utc::now();
    let window = engine.window();
    if window.uses_history() {
        engine.set_window(window, as_of).await;
    }

    let dashboard = engine.render(as_of);
    write_outputs(&engine, &dashboard, &config)?;

    if let Some(interval) = config.refresh_interval() {
        scheduler::run_refresh_loop(engine, interval, &config).await?;
    }
    Ok(())
}
