use async_trait::async_trait;

use super::ledger_model::LedgerTier;
use crate::errors::Result;
use crate::operations::LedgerRecord;

/// A bulk source of raw ledger records.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    fn name(&self) -> &str;

    fn tier(&self) -> LedgerTier;

    async fn fetch_records(&self) -> Result<Vec<LedgerRecord>>;
}
