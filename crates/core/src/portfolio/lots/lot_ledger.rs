use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::lots_model::{ClosedSaleChunk, Lot, OversellEvent, OversellFallback, SellOutcome};

/// FIFO queue of open lots plus the history of closed-sale chunks.
///
/// Lots below `epsilon` are dropped as soon as they appear, so the queue only
/// ever holds positive quantities.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotLedger {
    lots: VecDeque<Lot>,
    closed_sales: Vec<ClosedSaleChunk>,
    #[serde(skip)]
    epsilon: Decimal,
    #[serde(skip)]
    bought_quantity: Decimal,
    #[serde(skip)]
    bought_cost: Decimal,
}

impl LotLedger {
    pub fn new(epsilon: Decimal) -> Self {
        Self {
            lots: VecDeque::new(),
            closed_sales: Vec::new(),
            epsilon,
            bought_quantity: Decimal::ZERO,
            bought_cost: Decimal::ZERO,
        }
    }

    pub fn lots(&self) -> &VecDeque<Lot> {
        &self.lots
    }

    pub fn closed_sales(&self) -> &[ClosedSaleChunk] {
        &self.closed_sales
    }

    pub fn quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.quantity).sum()
    }

    pub fn cost_basis(&self) -> Decimal {
        self.lots.iter().map(Lot::cost).sum()
    }

    /// Average cost over every unit ever bought.
    pub fn running_average(&self) -> Decimal {
        if self.bought_quantity > Decimal::ZERO {
            self.bought_cost / self.bought_quantity
        } else {
            Decimal::ZERO
        }
    }

    /// Appends a lot to the back of the queue.
    pub fn buy(&mut self, quantity: Decimal, cost_per_unit: Decimal, acquired_at: Option<DateTime<Utc>>) {
        if quantity < self.epsilon {
            debug!("Ignoring buy of insignificant quantity {}", quantity);
            return;
        }
        let cost_per_unit = cost_per_unit.max(Decimal::ZERO);
        self.bought_quantity += quantity;
        self.bought_cost += quantity * cost_per_unit;
        self.lots.push_back(Lot {
            quantity,
            cost_per_unit,
            acquired_at,
        });
    }

    /// Sells `quantity` units for `proceeds`, oldest lot first.
    ///
    /// When the lots run out the remainder is matched against a synthetic
    /// chunk costed at the last purchase price, the running average, or the
    /// trade price, whichever is first positive, and an [`OversellEvent`] is
    /// returned with the outcome.
    pub fn sell(
        &mut self,
        sale_id: &str,
        quantity: Decimal,
        proceeds: Decimal,
        sell_date: Option<DateTime<Utc>>,
        last_purchase_price: Decimal,
    ) -> SellOutcome {
        if quantity <= Decimal::ZERO {
            return SellOutcome {
                matched_cost: Decimal::ZERO,
                proceeds: Decimal::ZERO,
                oversell: None,
            };
        }

        let Some(sell_price_per_unit) = proceeds.checked_div(quantity) else {
            warn!(
                "Skipping sale {}: {} over {} units is out of range",
                sale_id, proceeds, quantity
            );
            return SellOutcome {
                matched_cost: Decimal::ZERO,
                proceeds: Decimal::ZERO,
                oversell: None,
            };
        };
        let mut remaining = quantity;
        let mut matched_cost = Decimal::ZERO;

        while remaining > Decimal::ZERO {
            let Some(front) = self.lots.front_mut() else {
                break;
            };
            let take = front.quantity.min(remaining);
            let chunk_cost = take * front.cost_per_unit;
            self.closed_sales.push(ClosedSaleChunk {
                sale_id: sale_id.to_string(),
                quantity: take,
                buy_cost_per_unit: front.cost_per_unit,
                buy_date: front.acquired_at,
                sell_price_per_unit,
                sell_date,
                total_cost: chunk_cost,
                total_proceeds: take * sell_price_per_unit,
            });
            matched_cost += chunk_cost;
            remaining -= take;
            front.quantity -= take;
            if front.quantity < self.epsilon {
                self.lots.pop_front();
            }
        }

        let oversell = if remaining >= self.epsilon {
            let (fallback_unit_cost, fallback) =
                self.oversell_cost(last_purchase_price, sell_price_per_unit);
            warn!(
                "Sale {} exceeds open lots by {}. Costing the remainder at {} ({:?}).",
                sale_id, remaining, fallback_unit_cost, fallback
            );
            let chunk_cost = remaining * fallback_unit_cost;
            self.closed_sales.push(ClosedSaleChunk {
                sale_id: sale_id.to_string(),
                quantity: remaining,
                buy_cost_per_unit: fallback_unit_cost,
                buy_date: None,
                sell_price_per_unit,
                sell_date,
                total_cost: chunk_cost,
                total_proceeds: remaining * sell_price_per_unit,
            });
            matched_cost += chunk_cost;
            Some(OversellEvent {
                sale_id: sale_id.to_string(),
                missing_quantity: remaining,
                fallback_unit_cost,
                fallback,
            })
        } else {
            None
        };

        SellOutcome {
            matched_cost,
            proceeds,
            oversell,
        }
    }

    /// Removes units oldest first without recording a sale. Returns the cost
    /// basis removed.
    pub fn withdraw(&mut self, quantity: Decimal) -> Decimal {
        let mut remaining = quantity;
        let mut removed_cost = Decimal::ZERO;
        while remaining > Decimal::ZERO {
            let Some(front) = self.lots.front_mut() else {
                break;
            };
            let take = front.quantity.min(remaining);
            removed_cost += take * front.cost_per_unit;
            remaining -= take;
            front.quantity -= take;
            if front.quantity < self.epsilon {
                self.lots.pop_front();
            }
        }
        if remaining >= self.epsilon {
            warn!("Withdrawal exceeds open lots by {}", remaining);
        }
        removed_cost
    }

    /// Drops every open lot. Closed sales are kept.
    pub fn clear_lots(&mut self) {
        self.lots.clear();
    }

    fn oversell_cost(
        &self,
        last_purchase_price: Decimal,
        trade_price: Decimal,
    ) -> (Decimal, OversellFallback) {
        if last_purchase_price > Decimal::ZERO {
            (last_purchase_price, OversellFallback::LastPurchasePrice)
        } else if self.running_average() > Decimal::ZERO {
            (self.running_average(), OversellFallback::RunningAverage)
        } else {
            (trade_price.max(Decimal::ZERO), OversellFallback::TradePrice)
        }
    }
}
