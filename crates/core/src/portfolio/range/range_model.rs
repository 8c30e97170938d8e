use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::assets::AssetGroup;
use crate::errors::ValidationError;
use crate::portfolio::valuation::Direction;

/// Selectable P&L lookback window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PnlRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "1Y")]
    OneYear,
    #[default]
    #[serde(rename = "ALL")]
    All,
}

impl PnlRange {
    pub const ALL_RANGES: [PnlRange; 5] = [
        PnlRange::OneDay,
        PnlRange::OneWeek,
        PnlRange::OneMonth,
        PnlRange::OneYear,
        PnlRange::All,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PnlRange::OneDay => "1D",
            PnlRange::OneWeek => "1W",
            PnlRange::OneMonth => "1M",
            PnlRange::OneYear => "1Y",
            PnlRange::All => "ALL",
        }
    }

    /// `None` for the whole history.
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            PnlRange::OneDay => Some(Duration::days(1)),
            PnlRange::OneWeek => Some(Duration::days(7)),
            PnlRange::OneMonth => Some(Duration::days(30)),
            PnlRange::OneYear => Some(Duration::days(365)),
            PnlRange::All => None,
        }
    }

    /// Windows whose baseline comes from a historical series.
    pub fn uses_history(&self) -> bool {
        matches!(self, PnlRange::OneWeek | PnlRange::OneMonth | PnlRange::OneYear)
    }
}

impl fmt::Display for PnlRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PnlRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_uppercase();
        PnlRange::ALL_RANGES
            .into_iter()
            .find(|range| range.key() == key)
            .ok_or_else(|| ValidationError::InvalidInput(format!("Unknown range '{}'", s)))
    }
}

/// Window-scoped metrics of one position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeMetrics {
    pub window: PnlRange,
    pub baseline_price: Decimal,
    pub pnl: Decimal,
    pub change_percent: Decimal,
    /// Denominator used for `change_percent`.
    pub base_value: Decimal,
    pub direction: Option<Direction>,
}

/// Summed window P&L of a set of positions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotal {
    pub pnl: Decimal,
    pub base_value: Decimal,
    pub change_percent: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotals {
    pub window: PnlRange,
    pub by_group: BTreeMap<AssetGroup, RangeTotal>,
    pub overall: RangeTotal,
}
