//! Turns raw ledger records into typed [`Operation`]s.

use lazy_static::lazy_static;
use log::debug;
use num_traits::FromPrimitive;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

use super::operations_constants::*;
use super::operations_model::{LedgerRecord, Operation, OperationKind};
use crate::assets::AssetCategory;
use crate::constants::MAX_LEDGER_MAGNITUDE;
use crate::errors::ValidationError;
use crate::utils::time_utils::parse_ledger_date;

lazy_static! {
    static ref EXPENSE_KEYWORD: Regex =
        Regex::new(r"(?i)(repair|renov|tax|insur|mainten|fee|utilit)").unwrap();
}

/// Parses a JSON number or numeric string into a finite [`Decimal`].
///
/// Strings may carry thousands separators and a leading currency sign.
pub fn parse_decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).and_then(Decimal::from_f64))
        }
        Value::String(raw) => {
            let cleaned: String = raw
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .ok()
                .or_else(|| {
                    cleaned
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .and_then(Decimal::from_f64)
                })
        }
        _ => None,
    }
}

/// Maps an operation type label to its kind.
pub fn parse_operation_kind(label: Option<&str>) -> OperationKind {
    let key: String = label
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if OPERATION_LABELS_TRADE.contains(&key.as_str()) {
        OperationKind::Trade
    } else if OPERATION_LABELS_PROFIT_LOSS.contains(&key.as_str()) {
        OperationKind::ProfitLoss
    } else if OPERATION_LABELS_DEPOSIT_WITHDRAWAL.contains(&key.as_str()) {
        OperationKind::DepositWithdrawal
    } else {
        OperationKind::Other
    }
}

/// Tags arrive either as a JSON array or as one comma-separated string.
pub fn parse_tags(value: Option<&Value>) -> BTreeSet<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Expense tag, or a tag matching the expense keyword heuristic.
pub fn is_expense_tagged(tags: &BTreeSet<String>) -> bool {
    tags.iter()
        .any(|tag| EXPENSE_TAGS.contains(&tag.as_str()) || EXPENSE_KEYWORD.is_match(tag))
}

fn within_bounds(value: Decimal) -> bool {
    value.abs() <= Decimal::from(MAX_LEDGER_MAGNITUDE)
}

/// Parsed numeric column. Unparseable values read as absent; values beyond
/// [`MAX_LEDGER_MAGNITUDE`] fail the row.
fn bounded_field(name: &str, value: Option<&Value>) -> Result<Option<Decimal>, ValidationError> {
    match value.and_then(parse_decimal_value) {
        Some(parsed) if !within_bounds(parsed) => Err(ValidationError::InvalidNumber(format!(
            "{} {} out of range",
            name, parsed
        ))),
        parsed => Ok(parsed),
    }
}

/// Normalizes one record.
///
/// Fails when the asset name is empty, when a date is present but cannot be
/// parsed, or when a number is out of range. A missing date yields an
/// undated operation.
pub fn normalize_record(record: &LedgerRecord) -> Result<Operation, ValidationError> {
    let fields = &record.fields;
    let asset_key = fields
        .asset
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ValidationError::MissingField("Asset".to_string()))?
        .to_string();

    let date = match fields.date.as_ref() {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(parse_ledger_date(value)?),
    };

    let category = AssetCategory::normalize(fields.category.as_deref(), &asset_key);
    let kind = parse_operation_kind(fields.operation_type.as_deref());

    let signed_quantity = bounded_field("Amount", fields.amount.as_ref())?.unwrap_or(Decimal::ZERO);
    let unit_price = bounded_field("Price", fields.price.as_ref())?.unwrap_or(Decimal::ZERO);
    let signed_cash_impact = match bounded_field("Spent", fields.spent.as_ref())? {
        Some(spent) => spent,
        None => signed_quantity
            .checked_mul(unit_price)
            .filter(|cash| within_bounds(*cash))
            .ok_or_else(|| {
                ValidationError::InvalidNumber(format!(
                    "Amount {} x Price {} out of range",
                    signed_quantity, unit_price
                ))
            })?,
    };

    let tags = parse_tags(fields.tags.as_ref());
    let is_reinvestment = tags.contains(TAG_REINVESTING);
    let is_rent =
        kind == OperationKind::ProfitLoss && RENT_TAGS.iter().any(|tag| tags.contains(*tag));
    let is_expense = is_expense_tagged(&tags);

    Ok(Operation {
        id: record.id.clone(),
        asset_key,
        category,
        kind,
        date,
        signed_quantity,
        unit_price,
        signed_cash_impact,
        tags,
        is_reinvestment,
        is_rent,
        is_expense,
    })
}

/// Normalizes a batch, silently dropping rows that cannot be normalized.
pub fn normalize_records(records: &[LedgerRecord]) -> Vec<Operation> {
    records
        .iter()
        .filter_map(|record| match normalize_record(record) {
            Ok(operation) => Some(operation),
            Err(e) => {
                debug!("Discarding ledger record '{}': {}", record.id, e);
                None
            }
        })
        .collect()
}
