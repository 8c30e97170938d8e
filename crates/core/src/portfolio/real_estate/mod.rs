//! Real estate module - cash-flow analytics of non-fungible assets.

mod real_estate_calculator;
mod real_estate_model;

#[cfg(test)]
mod real_estate_calculator_tests;

pub use real_estate_calculator::{classify, compute_real_estate_stat, compute_real_estate_stats};
pub use real_estate_model::{CashFlowClass, ProjectionRates, RealEstateStat};
