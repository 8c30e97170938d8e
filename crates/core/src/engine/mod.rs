//! Engine module - the session engine, render scheduling and dashboard output.

mod csv_export;
mod dashboard_model;
mod portfolio_engine;
mod render_scheduler;

#[cfg(test)]
mod portfolio_engine_tests;

pub use csv_export::export_positions_csv;
pub use dashboard_model::{AllocationSlice, Dashboard, PositionRow};
pub use portfolio_engine::PortfolioEngine;
pub use render_scheduler::{RenderDecision, RenderRequest, RenderScheduler, RenderState};
