//! Folds normalized operations into per-asset positions.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::positions_model::Position;
use crate::constants::MAX_LEDGER_MAGNITUDE;
use crate::operations::{Operation, OperationKind};

/// Builds positions from scratch on every reload.
#[derive(Debug, Clone)]
pub struct PositionAggregator {
    epsilon: Decimal,
}

impl PositionAggregator {
    pub fn new(epsilon: Decimal) -> Self {
        Self { epsilon }
    }

    /// One position per asset key, in first-seen order. Each asset's
    /// operations are folded in date order; undated operations come first.
    pub fn aggregate(&self, operations: &[Operation]) -> Vec<Position> {
        let mut ordered: Vec<&Operation> = operations.iter().collect();
        ordered.sort_by_key(|op| op.date);

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut positions: Vec<Position> = Vec::new();
        for op in operations {
            if !index.contains_key(op.asset_key.as_str()) {
                index.insert(op.asset_key.as_str(), positions.len());
                positions.push(Position::new(&op.asset_key, op.category, self.epsilon));
            }
        }

        for op in ordered {
            if let Some(&i) = index.get(op.asset_key.as_str()) {
                let position = &mut positions[i];
                self.apply(position, op);
                position.operations.push(op.clone());
            }
        }

        for position in positions.iter_mut() {
            self.finish(position);
        }
        debug!(
            "Aggregated {} operations into {} positions",
            operations.len(),
            positions.len()
        );
        positions
    }

    /// Applies one operation in place.
    pub fn apply(&self, position: &mut Position, op: &Operation) {
        let cash = op.signed_cash_impact;
        match op.kind {
            OperationKind::Trade => {
                if op.is_buy() {
                    self.apply_buy(position, op);
                } else if op.is_sell() {
                    self.apply_sell(position, op);
                }
                position.cashflow += cash;
            }
            OperationKind::ProfitLoss if op.is_reinvestment => {
                self.apply_reinvestment(position, op);
            }
            OperationKind::ProfitLoss if op.is_rent => {
                position.rent_realized += cash;
            }
            OperationKind::ProfitLoss => {
                position.realized += cash;
                position.cashflow += cash;
            }
            OperationKind::DepositWithdrawal => {
                self.apply_deposit_withdrawal(position, op);
                position.cashflow += cash;
            }
            OperationKind::Other => {
                position.cashflow += cash;
            }
        }
        self.snap_residue(position);
    }

    fn apply_buy(&self, position: &mut Position, op: &Operation) {
        let quantity = op.quantity();
        let cash = op.signed_cash_impact;
        let total_cost = if cash.is_zero() {
            quantity * op.unit_price
        } else {
            cash.abs()
        };
        let Some(unit_cost) = unit_cost(total_cost, quantity) else {
            warn!(
                "Skipping buy {} on {}: unit cost of {} over {} units is out of range",
                op.id, position.asset_key, total_cost, quantity
            );
            return;
        };

        if cash > Decimal::ZERO {
            position.invested += cash;
        }
        if unit_cost > Decimal::ZERO {
            position.last_purchase_price = unit_cost;
            position.last_known_price = unit_cost;
        }

        match position.lot_ledger.as_mut() {
            Some(ledger) => {
                ledger.buy(quantity, unit_cost, op.date);
                position.sync_from_lots();
            }
            None => {
                position.quantity += quantity;
                position.cost_basis += total_cost;
            }
        }
    }

    fn apply_sell(&self, position: &mut Position, op: &Operation) {
        let sold = op.quantity();
        let cash = op.signed_cash_impact;
        let proceeds = if cash < Decimal::ZERO {
            cash.abs()
        } else {
            sold * op.unit_price
        };

        let last_purchase_price = position.last_purchase_price;
        match position.lot_ledger.as_mut() {
            Some(ledger) => {
                let outcome = ledger.sell(&op.id, sold, proceeds, op.date, last_purchase_price);
                position.realized += outcome.realized();
                if let Some(event) = outcome.oversell {
                    warn!(
                        "Position {} oversold by {} in operation {}",
                        position.asset_key, event.missing_quantity, op.id
                    );
                    position.oversells.push(event);
                }
                position.sync_from_lots();
            }
            None => {
                let avg_cost = if position.quantity > Decimal::ZERO {
                    position.cost_basis / position.quantity
                } else if position.last_purchase_price > Decimal::ZERO {
                    position.last_purchase_price
                } else {
                    op.unit_price
                };
                let cost_out = avg_cost * sold;
                position.quantity = (position.quantity - sold).max(Decimal::ZERO);
                position.cost_basis = (position.cost_basis - cost_out).max(Decimal::ZERO);
                position.realized += proceeds - cost_out;
            }
        }
    }

    fn apply_reinvestment(&self, position: &mut Position, op: &Operation) {
        let price = [
            op.unit_price,
            position.last_purchase_price,
            position.average_cost(),
        ]
        .into_iter()
        .find(|p| *p > Decimal::ZERO);

        match price {
            Some(price) => match op.signed_cash_impact.checked_div(price) {
                Some(units) => position.reinvested_quantity += units,
                None => warn!(
                    "Skipping reinvestment {} on {}: {} at {} is out of range",
                    op.id, position.asset_key, op.signed_cash_impact, price
                ),
            },
            None => debug!(
                "No price to convert reinvestment {} on {}",
                op.id, position.asset_key
            ),
        }
    }

    fn apply_deposit_withdrawal(&self, position: &mut Position, op: &Operation) {
        let cash = op.signed_cash_impact;
        match position.lot_ledger.as_mut() {
            Some(ledger) => {
                if op.is_buy() {
                    let quantity = op.quantity();
                    let cost = if cash.is_zero() {
                        Some(op.unit_price)
                    } else {
                        unit_cost(cash.abs(), quantity)
                    };
                    match cost {
                        Some(cost) => ledger.buy(quantity, cost, op.date),
                        None => warn!(
                            "Skipping deposit {} on {}: unit cost out of range",
                            op.id, position.asset_key
                        ),
                    }
                } else if op.is_sell() {
                    ledger.withdraw(op.quantity());
                }
                position.sync_from_lots();
            }
            None => {
                position.quantity += op.signed_quantity;
                position.cost_basis += cash;
            }
        }
        if position.last_known_price.is_zero() && op.unit_price > Decimal::ZERO {
            position.last_known_price = op.unit_price;
        }
    }

    fn snap_residue(&self, position: &mut Position) {
        if position.lot_ledger.is_none() && position.quantity < self.epsilon {
            position.quantity = Decimal::ZERO;
            position.cost_basis = Decimal::ZERO;
        }
    }

    fn finish(&self, position: &mut Position) {
        if position.quantity < self.epsilon {
            position.quantity = Decimal::ZERO;
            position.cost_basis = Decimal::ZERO;
            if let Some(ledger) = position.lot_ledger.as_mut() {
                ledger.clear_lots();
            }
        }
        if position.last_known_price.is_zero() {
            position.last_known_price = if position.last_purchase_price > Decimal::ZERO {
                position.last_purchase_price
            } else {
                position.average_cost()
            };
        }
    }
}

/// Cost per unit, or `None` when dust quantities push it out of range.
fn unit_cost(total_cost: Decimal, quantity: Decimal) -> Option<Decimal> {
    total_cost
        .checked_div(quantity)
        .filter(|cost| cost.abs() <= Decimal::from(MAX_LEDGER_MAGNITUDE))
}
