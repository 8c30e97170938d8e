use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::ledger_model::{LedgerSnapshot, LedgerTier};
use super::ledger_traits::LedgerSource;
use crate::errors::{LedgerError, Result};
use crate::operations::LedgerRecord;

/// JSON file holding the records of the last successful live load.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<LedgerSnapshot> {
        if !self.path.exists() {
            return Err(LedgerError::SnapshotMissing(self.path.display().to_string()).into());
        }
        let raw = fs::read_to_string(&self.path)?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&raw)?;
        debug!(
            "Loaded {} records from snapshot {}",
            snapshot.records.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    /// Writes the records, creating parent directories as needed.
    pub fn save(&self, records: &[LedgerRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let snapshot = LedgerSnapshot {
            saved_at: Utc::now(),
            records: records.to_vec(),
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        info!(
            "Saved {} ledger records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl LedgerSource for SnapshotStore {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn tier(&self) -> LedgerTier {
        LedgerTier::Snapshot
    }

    async fn fetch_records(&self) -> Result<Vec<LedgerRecord>> {
        Ok(self.load()?.records)
    }
}
