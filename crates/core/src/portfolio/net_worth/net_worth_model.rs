use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub value: Decimal,
}

impl TimelinePoint {
    pub fn new(date: DateTime<Utc>, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// Chart domain covering actual and projected points.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDomain {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_value: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneEstimate {
    pub target: Decimal,
    /// Estimated crossing date; `None` when the horizon ends first.
    pub date: Option<DateTime<Utc>>,
    pub already_reached: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthTimeline {
    pub actual_points: Vec<TimelinePoint>,
    pub projected_points: Vec<TimelinePoint>,
    pub domain: TimelineDomain,
    pub milestone: MilestoneEstimate,
}

/// Compounding assumptions of the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    pub growth_rate: Decimal,
    pub short_years: u32,
    pub horizon_years: u32,
    pub milestone: Decimal,
}
