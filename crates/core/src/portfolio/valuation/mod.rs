//! Valuation module - price resolution, market value and P&L of a position.

mod valuation_calculator;
mod valuation_model;

#[cfg(test)]
mod valuation_calculator_tests;

pub use valuation_calculator::{apply_quote_to_position, resolve_price, revalue};
pub use valuation_model::{Direction, PositionQuote, PositionValuation, PriceSource, QuoteStatus};
