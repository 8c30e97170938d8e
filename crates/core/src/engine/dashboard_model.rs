use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assets::AssetGroup;
use crate::ledger::LedgerMeta;
use crate::portfolio::{Direction, PnlRange, QuoteStatus, RangeTotals};

/// One row of the positions table and of the CSV export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionRow {
    pub asset_key: String,
    pub display_name: String,
    pub symbol: Option<String>,
    pub category: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    /// Window P&L.
    pub pnl: Decimal,
    pub change_percent: Decimal,
    pub daily_change_percent: Decimal,
    pub quote_status: QuoteStatus,
    pub direction: Option<Direction>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub group: AssetGroup,
    pub market_value: Decimal,
    /// Share of total market value, in percent.
    pub weight: Decimal,
}

/// Everything a renderer needs for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub window: PnlRange,
    /// Total market value of every position.
    pub equity: Decimal,
    pub cash_available: Decimal,
    pub total_range_pnl: Decimal,
    pub total_range_change_percent: Decimal,
    pub allocation: Vec<AllocationSlice>,
    pub range_totals: Option<RangeTotals>,
    pub positions: Vec<PositionRow>,
    pub ledger: Option<LedgerMeta>,
}
