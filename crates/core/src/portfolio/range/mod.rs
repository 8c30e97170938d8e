//! Range module - window-scoped P&L with cached baselines.

mod baseline_cache;
mod range_engine;
mod range_model;


pub use baseline_cache::BaselineCache;
pub use range_engine::RangeEngine;
pub use range_model::{PnlRange, RangeMetrics, RangeTotal, RangeTotals};
