use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::AssetCategory;

/// How a real-asset operation counts towards the cash-flow analysis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowClass {
    Purchase,
    Expense,
    Rent,
    Reinvestment,
    Unclassified,
}

/// Cash-flow statistics of one non-fungible position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealEstateStat {
    pub asset_key: String,
    pub category: AssetCategory,
    pub total_purchase: Decimal,
    pub total_expenses: Decimal,
    pub rent_collected: Decimal,
    pub rent_ytd: Decimal,
    pub rent_trailing_12m: Decimal,
    pub rent_trailing_30d: Decimal,
    /// `YYYY-MM` keys of every month with rent, ascending.
    pub rent_months: Vec<String>,
    pub final_asset_price: Decimal,
    pub outstanding: Decimal,
    pub utilization: Decimal,
    pub avg_monthly_rent: Decimal,
    /// `None` when there is no positive average rent.
    pub payoff_months: Option<Decimal>,
    pub first_date: Option<DateTime<Utc>>,
    pub years_held: Decimal,
    pub projected_value: Decimal,
}

/// Yearly rates for the real-asset projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRates {
    pub appreciation: Decimal,
    pub depreciation: Decimal,
}
