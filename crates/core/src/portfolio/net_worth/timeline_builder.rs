//! Net-worth timeline: cumulative invested capital, anchored to the live
//! market value and projected forward.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::net_worth_model::{
    MilestoneEstimate, NetWorthTimeline, ProjectionSettings, TimelineDomain, TimelinePoint,
};
use crate::operations::Operation;
use crate::utils::time_utils::{start_of_day, years_after};

/// Builds the timeline from every operation and the current total market
/// value.
pub fn build_net_worth_timeline(
    operations: &[Operation],
    total_market_value: Decimal,
    as_of: DateTime<Utc>,
    settings: &ProjectionSettings,
) -> NetWorthTimeline {
    let today = start_of_day(as_of.date_naive());

    let mut buckets: BTreeMap<DateTime<Utc>, Decimal> = BTreeMap::new();
    for op in operations {
        if let Some(date) = op.date {
            *buckets.entry(start_of_day(date.date_naive())).or_default() +=
                op.signed_cash_impact;
        }
    }

    let mut running = Decimal::ZERO;
    let mut actual_points: Vec<TimelinePoint> = Vec::with_capacity(buckets.len() + 1);
    for (day, delta) in buckets {
        running = (running + delta).max(Decimal::ZERO);
        if day < today {
            actual_points.push(TimelinePoint::new(day, running));
        }
    }
    let anchor = TimelinePoint::new(as_of, total_market_value);
    actual_points.push(anchor.clone());

    let projected_points = project(&anchor, settings.short_years, settings.growth_rate);
    let milestone = estimate_milestone(&anchor, settings);

    let start = actual_points.first().map_or(as_of, |p| p.date);
    let end = projected_points.last().map_or(as_of, |p| p.date);
    let max_value = actual_points
        .iter()
        .chain(projected_points.iter())
        .map(|p| p.value)
        .max()
        .unwrap_or(Decimal::ZERO);

    NetWorthTimeline {
        actual_points,
        projected_points,
        domain: TimelineDomain {
            start,
            end,
            max_value,
        },
        milestone,
    }
}

/// Yearly compounded points starting at the anchor. A non-positive anchor is
/// held flat.
fn project(anchor: &TimelinePoint, years: u32, growth_rate: Decimal) -> Vec<TimelinePoint> {
    let factor = Decimal::ONE + growth_rate;
    let mut points = vec![anchor.clone()];
    let mut value = anchor.value;
    for year in 1..=years {
        if anchor.value > Decimal::ZERO {
            value *= factor;
        }
        points.push(TimelinePoint::new(years_after(anchor.date, year), value));
    }
    points
}

/// Linear interpolation between the last projected point below the
/// milestone and the first at or above it.
fn estimate_milestone(anchor: &TimelinePoint, settings: &ProjectionSettings) -> MilestoneEstimate {
    let target = settings.milestone;
    if anchor.value >= target {
        return MilestoneEstimate {
            target,
            date: Some(anchor.date),
            already_reached: true,
        };
    }

    let extended = project(anchor, settings.horizon_years, settings.growth_rate);
    let date = extended
        .windows(2)
        .find(|pair| pair[0].value < target && pair[1].value >= target)
        .and_then(|pair| {
            let (below, above) = (&pair[0], &pair[1]);
            let fraction = (target - below.value) / (above.value - below.value);
            let span = (above.date - below.date).num_seconds();
            let offset = (Decimal::from(span) * fraction).round();
            offset
                .to_i64()
                .map(|secs| below.date + chrono::Duration::seconds(secs))
        });

    MilestoneEstimate {
        target,
        date,
        already_reached: false,
    }
}
