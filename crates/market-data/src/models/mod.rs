//! Market data models
//!
//! - `types` - The instrument class used for routing
//! - `quote` - Snapshot quotes and the per-request quote context
//! - `history` - Historical close points and tier merging

mod history;
mod quote;
mod types;

pub use history::{earliest_close, merge_series, PricePoint};
pub use quote::{QuoteContext, QuoteSnapshot};
pub use types::InstrumentClass;
