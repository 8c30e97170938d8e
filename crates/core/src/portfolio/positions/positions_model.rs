use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerfolio_market_data::{primary_symbol, QuoteContext};

use crate::assets::AssetCategory;
use crate::constants::CASH_DISPLAY_NAME;
use crate::operations::Operation;
use crate::portfolio::lots::{ClosedSaleChunk, Lot, LotLedger, OversellEvent};
use crate::portfolio::range::RangeMetrics;
use crate::portfolio::valuation::{PositionQuote, PositionValuation};

/// Holdings and running performance of one asset.
///
/// For lot-tracked categories `quantity` and `cost_basis` are always copies of
/// the lot ledger's sums, refreshed by [`Position::sync_from_lots`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset_key: String,
    pub display_name: String,
    pub symbol: Option<String>,
    pub category: AssetCategory,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub invested: Decimal,
    pub realized: Decimal,
    pub reinvested_quantity: Decimal,
    pub rent_realized: Decimal,
    pub cashflow: Decimal,
    pub last_purchase_price: Decimal,
    pub last_known_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_ledger: Option<LotLedger>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub oversells: Vec<OversellEvent>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub quote: PositionQuote,
    #[serde(default)]
    pub valuation: PositionValuation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeMetrics>,
}

impl Position {
    pub fn new(asset_key: &str, category: AssetCategory, epsilon: Decimal) -> Self {
        let display_name = if category == AssetCategory::Cash {
            CASH_DISPLAY_NAME.to_string()
        } else {
            asset_key.to_string()
        };
        let symbol = category
            .instrument_class()
            .and_then(|class| primary_symbol(asset_key, class));

        Position {
            asset_key: asset_key.to_string(),
            display_name,
            symbol,
            category,
            quantity: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            invested: Decimal::ZERO,
            realized: Decimal::ZERO,
            reinvested_quantity: Decimal::ZERO,
            rent_realized: Decimal::ZERO,
            cashflow: Decimal::ZERO,
            last_purchase_price: Decimal::ZERO,
            last_known_price: Decimal::ZERO,
            lot_ledger: category.tracks_lots().then(|| LotLedger::new(epsilon)),
            oversells: Vec::new(),
            operations: Vec::new(),
            quote: PositionQuote::default(),
            valuation: PositionValuation::default(),
            range: None,
        }
    }

    /// Weighted-average cost per unit, zero when nothing is held.
    pub fn average_cost(&self) -> Decimal {
        if self.quantity > Decimal::ZERO {
            self.cost_basis / self.quantity
        } else {
            Decimal::ZERO
        }
    }

    pub fn open_lots(&self) -> Vec<Lot> {
        self.lot_ledger
            .as_ref()
            .map(|ledger| ledger.lots().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn closed_sales(&self) -> &[ClosedSaleChunk] {
        self.lot_ledger
            .as_ref()
            .map(LotLedger::closed_sales)
            .unwrap_or_default()
    }

    /// Re-derives quantity and cost basis from the lot ledger.
    pub fn sync_from_lots(&mut self) {
        if let Some(ledger) = &self.lot_ledger {
            self.quantity = ledger.quantity();
            self.cost_basis = ledger.cost_basis();
        }
    }

    pub fn has_rent(&self) -> bool {
        self.operations.iter().any(|op| op.is_rent)
    }

    pub fn first_operation_date(&self) -> Option<DateTime<Utc>> {
        self.operations.iter().filter_map(|op| op.date).min()
    }

    /// Quote routing context, `None` for categories without a market symbol.
    pub fn quote_context(&self) -> Option<QuoteContext> {
        let class = self.category.instrument_class()?;
        let symbol = self.symbol.as_ref()?;
        Some(QuoteContext::new(self.asset_key.clone(), symbol.clone(), class))
    }

    /// Key under which range baselines are cached.
    pub fn baseline_key(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.asset_key)
    }
}
