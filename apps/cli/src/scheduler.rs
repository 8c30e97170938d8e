//! Watch mode: periodic quote refresh with throttled dashboard output.

use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info};

use ledgerfolio_core::engine::{PortfolioEngine, RenderRequest};

use crate::config::Config;
use crate::main_lib::write_outputs;

/// How often the loop checks for a due render.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Refreshes quotes every `refresh` and prints a dashboard whenever the
/// render scheduler lets one through. Stops on Ctrl-C.
pub async fn run_refresh_loop(
    mut engine: PortfolioEngine,
    refresh: Duration,
    config: &Config,
) -> anyhow::Result<()> {
    info!("Refreshing quotes every {}s", refresh.as_secs());
    let mut refresh_tick = interval(refresh);
    let mut poll_tick = interval(POLL_INTERVAL);
    // The first tick completes immediately; the initial load already fetched.
    refresh_tick.tick().await;

    loop {
        tokio::select! {
            _ = refresh_tick.tick() => {
                let accepted = engine.preload_quotes().await;
                debug!("Refresh accepted {} quotes", accepted);
                engine.request_render(RenderRequest::Normal, Instant::now());
            }
            _ = poll_tick.tick() => {
                if let Some(dashboard) = engine.poll_render(Instant::now(), Utc::now()) {
                    write_outputs(&engine, &dashboard, config)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping refresh loop");
                return Ok(());
            }
        }
    }
}
