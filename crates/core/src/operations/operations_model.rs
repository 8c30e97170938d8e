//! Ledger record and operation models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::assets::AssetCategory;

/// Raw ledger record as delivered by the ledger source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: LedgerFields,
}

/// Raw ledger columns. Numeric columns stay as JSON values and are parsed
/// leniently by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LedgerFields {
    #[serde(rename = "Asset", alias = "Name", default)]
    pub asset: Option<String>,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
    #[serde(rename = "Operation type", alias = "Operation", default)]
    pub operation_type: Option<String>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<Value>,
    #[serde(rename = "Asset price on invest date", alias = "Price", default)]
    pub price: Option<Value>,
    #[serde(rename = "Spent on operation", alias = "Spent", default)]
    pub spent: Option<Value>,
    #[serde(rename = "Date", default)]
    pub date: Option<Value>,
    #[serde(rename = "Tags", default)]
    pub tags: Option<Value>,
}

impl LedgerRecord {
    pub fn new(id: impl Into<String>, fields: LedgerFields) -> Self {
        Self {
            id: id.into(),
            created_time: None,
            fields,
        }
    }
}

/// Closed set of operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Trade,
    ProfitLoss,
    DepositWithdrawal,
    Other,
}

/// A normalized, immutable ledger fact.
///
/// Sign conventions: `signed_quantity > 0` adds units, `< 0` removes them.
/// For trades and deposits `signed_cash_impact > 0` is cash put into the
/// asset; for profit/loss rows it is a gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub asset_key: String,
    pub category: AssetCategory,
    pub kind: OperationKind,
    pub date: Option<DateTime<Utc>>,
    pub signed_quantity: Decimal,
    pub unit_price: Decimal,
    pub signed_cash_impact: Decimal,
    pub tags: BTreeSet<String>,
    pub is_reinvestment: bool,
    pub is_rent: bool,
    pub is_expense: bool,
}

impl Operation {
    pub fn is_buy(&self) -> bool {
        self.signed_quantity > Decimal::ZERO
    }

    pub fn is_sell(&self) -> bool {
        self.signed_quantity < Decimal::ZERO
    }

    /// Units moved by this operation, unsigned.
    pub fn quantity(&self) -> Decimal {
        self.signed_quantity.abs()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
