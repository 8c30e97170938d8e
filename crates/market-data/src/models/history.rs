use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical close.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self { timestamp, close }
    }
}

/// Merges several provider series into one time-sorted series.
///
/// Points are keyed by timestamp. Tiers are applied in iteration order, so on
/// a collision the value from the tier merged last wins.
pub fn merge_series<I>(tiers: I) -> Vec<PricePoint>
where
    I: IntoIterator<Item = Vec<PricePoint>>,
{
    let mut merged: BTreeMap<DateTime<Utc>, Decimal> = BTreeMap::new();
    for series in tiers {
        for point in series {
            merged.insert(point.timestamp, point.close);
        }
    }
    merged
        .into_iter()
        .map(|(timestamp, close)| PricePoint { timestamp, close })
        .collect()
}

/// Earliest positive close in a series, regardless of its ordering.
pub fn earliest_close(series: &[PricePoint]) -> Option<Decimal> {
    series
        .iter()
        .filter(|p| p.close > Decimal::ZERO)
        .min_by_key(|p| p.timestamp)
        .map(|p| p.close)
}
