use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::constants::DAYS_PER_YEAR;
use crate::errors::ValidationError;

/// Epoch values at or above this are milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses a ledger date value: a date string in one of the accepted formats,
/// a numeric string, or a JSON number holding epoch seconds or milliseconds.
///
/// Strings are tried as RFC 3339 first, then as naive date-times and plain
/// dates (midnight UTC), then as an epoch number.
pub fn parse_ledger_date(value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    match value {
        Value::String(raw) => parse_date_str(raw),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ValidationError::InvalidDate(n.to_string()))
            .and_then(from_epoch),
        other => Err(ValidationError::InvalidDate(other.to_string())),
    }
}

/// Parses a date string, see [`parse_ledger_date`].
pub fn parse_date_str(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDate(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(start_of_day(date));
        }
    }

    trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
        .and_then(from_epoch)
}

/// Epoch seconds, or milliseconds when the magnitude says so.
pub fn from_epoch(raw: f64) -> Result<DateTime<Utc>, ValidationError> {
    if !raw.is_finite() {
        return Err(ValidationError::InvalidDate(raw.to_string()));
    }
    let millis = if raw.abs() >= EPOCH_MILLIS_THRESHOLD {
        raw as i64
    } else {
        (raw * 1000.0) as i64
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Calendar month key, `YYYY-MM`.
pub fn month_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m").to_string()
}

/// `instant` moved back by whole calendar months, clamped to month end.
pub fn months_before(instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    instant
        .checked_sub_months(Months::new(months))
        .unwrap_or(instant)
}

/// `instant` moved forward by whole years.
pub fn years_after(instant: DateTime<Utc>, years: u32) -> DateTime<Utc> {
    instant
        .checked_add_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(instant)
}

/// Fractional years between two instants (365.25-day years), never negative.
pub fn years_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let days = Decimal::from((end - start).num_days().max(0));
    let days_per_year = Decimal::from_str(DAYS_PER_YEAR).unwrap_or(Decimal::from(365));
    days / days_per_year
}
