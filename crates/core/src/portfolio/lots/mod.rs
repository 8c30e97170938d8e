//! FIFO lot ledger for tradable assets.

mod lot_ledger;
mod lots_model;


pub use lot_ledger::LotLedger;
pub use lots_model::{ClosedSaleChunk, Lot, OversellEvent, OversellFallback, SellOutcome};
