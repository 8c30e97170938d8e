//! Ledger loading with live -> snapshot -> demo fallback.

use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use super::ledger_model::LedgerLoad;
use super::ledger_traits::LedgerSource;
use crate::errors::{LedgerError, Result};

/// Tries each source in order and returns the first non-empty load.
pub struct TieredLedgerLoader {
    sources: Vec<Arc<dyn LedgerSource>>,
}

impl TieredLedgerLoader {
    /// Sources are tried in tier order; registration order breaks ties.
    pub fn new(mut sources: Vec<Arc<dyn LedgerSource>>) -> Self {
        sources.sort_by_key(|source| source.tier());
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn load(&self) -> Result<LedgerLoad> {
        for source in &self.sources {
            match source.fetch_records().await {
                Ok(records) if !records.is_empty() => {
                    info!(
                        "Loaded {} ledger records from {} ({} tier)",
                        records.len(),
                        source.name(),
                        source.tier()
                    );
                    return Ok(LedgerLoad {
                        records,
                        source_name: source.name().to_string(),
                        tier: source.tier(),
                        fetched_at: Utc::now(),
                    });
                }
                Ok(_) => {
                    let err = LedgerError::Empty(source.name().to_string());
                    warn!("{}, trying next tier", err);
                }
                Err(e) => {
                    warn!(
                        "Ledger source {} failed: {}, trying next tier",
                        source.name(),
                        e
                    );
                }
            }
        }
        Err(LedgerError::AllSourcesFailed.into())
    }
}
