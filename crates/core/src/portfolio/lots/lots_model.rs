use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open cost lot. Owned by exactly one [`super::LotLedger`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub acquired_at: Option<DateTime<Utc>>,
}

impl Lot {
    pub fn cost(&self) -> Decimal {
        self.quantity * self.cost_per_unit
    }
}

/// One FIFO match between a sell and a lot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSaleChunk {
    pub sale_id: String,
    pub quantity: Decimal,
    pub buy_cost_per_unit: Decimal,
    pub buy_date: Option<DateTime<Utc>>,
    pub sell_price_per_unit: Decimal,
    pub sell_date: Option<DateTime<Utc>>,
    pub total_cost: Decimal,
    pub total_proceeds: Decimal,
}

impl ClosedSaleChunk {
    pub fn realized(&self) -> Decimal {
        self.total_proceeds - self.total_cost
    }
}

/// Which price stood in for the cost of units sold beyond the open lots.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OversellFallback {
    LastPurchasePrice,
    RunningAverage,
    TradePrice,
}

/// A sell that exceeded the open lots. The missing units were matched
/// against a synthetic chunk costed at `fallback_unit_cost`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OversellEvent {
    pub sale_id: String,
    pub missing_quantity: Decimal,
    pub fallback_unit_cost: Decimal,
    pub fallback: OversellFallback,
}

/// Result of a single sell against the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct SellOutcome {
    pub matched_cost: Decimal,
    pub proceeds: Decimal,
    pub oversell: Option<OversellEvent>,
}

impl SellOutcome {
    pub fn realized(&self) -> Decimal {
        self.proceeds - self.matched_cost
    }
}
