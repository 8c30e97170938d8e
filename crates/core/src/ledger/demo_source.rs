use async_trait::async_trait;
use serde_json::json;

use super::ledger_model::LedgerTier;
use super::ledger_traits::LedgerSource;
use crate::errors::Result;
use crate::operations::{LedgerFields, LedgerRecord};

/// Built-in demo rows, the last fallback tier.
#[derive(Debug, Clone, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn records() -> Vec<LedgerRecord> {
        let row = |id: &str, asset: &str, category: &str, op: &str, amount: f64, price: f64| {
            LedgerRecord::new(
                id,
                LedgerFields {
                    asset: Some(asset.to_string()),
                    category: Some(category.to_string()),
                    operation_type: Some(op.to_string()),
                    amount: Some(json!(amount)),
                    price: Some(json!(price)),
                    spent: Some(json!(amount * price)),
                    date: None,
                    tags: None,
                },
            )
        };
        vec![
            row("demo-aapl", "AAPL", "Stock", "PurchaseSell", 10.0, 150.0),
            row("demo-btc", "BTC", "Crypto", "PurchaseSell", 0.25, 30000.0),
            row("demo-cash", "Cash", "Cash", "DepositWithdrawal", 2500.0, 1.0),
        ]
    }
}

#[async_trait]
impl LedgerSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    fn tier(&self) -> LedgerTier {
        LedgerTier::Demo
    }

    async fn fetch_records(&self) -> Result<Vec<LedgerRecord>> {
        Ok(Self::records())
    }
}
