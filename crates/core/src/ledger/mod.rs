//! Ledger module - record sources and tiered loading.

mod demo_source;
mod ledger_model;
mod ledger_traits;
mod snapshot_store;
mod tiered_loader;


pub use demo_source::DemoSource;
pub use ledger_model::{LedgerLoad, LedgerMeta, LedgerSnapshot, LedgerTier};
pub use ledger_traits::LedgerSource;
pub use snapshot_store::SnapshotStore;
pub use tiered_loader::TieredLedgerLoader;
