use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::operations::LedgerRecord;

/// Ledger source tier, in fallback order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerTier {
    Live,
    Snapshot,
    Demo,
}

impl fmt::Display for LedgerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LedgerTier::Live => "live",
            LedgerTier::Snapshot => "snapshot",
            LedgerTier::Demo => "demo",
        };
        f.write_str(label)
    }
}

/// Records returned by the first tier that produced any.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerLoad {
    pub records: Vec<LedgerRecord>,
    pub source_name: String,
    pub tier: LedgerTier,
    pub fetched_at: DateTime<Utc>,
}

impl LedgerLoad {
    pub fn meta(&self) -> LedgerMeta {
        LedgerMeta {
            count: self.records.len(),
            fetched_at: self.fetched_at,
            tier: self.tier,
            source_name: self.source_name.clone(),
        }
    }
}

/// Load summary shown on the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMeta {
    pub count: usize,
    pub fetched_at: DateTime<Utc>,
    pub tier: LedgerTier,
    pub source_name: String,
}

/// On-disk snapshot of the last live load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub saved_at: DateTime<Utc>,
    pub records: Vec<LedgerRecord>,
}
