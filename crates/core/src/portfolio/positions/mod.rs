//! Positions module - per-asset holdings and the aggregator that builds them.

mod aggregator;
mod positions_model;


pub use aggregator::PositionAggregator;
pub use positions_model::Position;
