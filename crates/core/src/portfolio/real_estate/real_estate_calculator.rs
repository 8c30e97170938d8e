//! Cash-flow analytics for real estate and vehicles.

use chrono::{DateTime, Datelike, Duration, Utc};
use log::warn;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

use super::real_estate_model::{CashFlowClass, ProjectionRates, RealEstateStat};
use crate::operations::{Operation, OperationKind};
use crate::portfolio::positions::Position;
use crate::utils::time_utils::{month_key, months_before, years_between};

/// Classifies one operation of a real asset.
pub fn classify(op: &Operation) -> CashFlowClass {
    if op.is_reinvestment {
        CashFlowClass::Reinvestment
    } else if op.kind == OperationKind::Trade && op.is_buy() && !op.is_expense {
        CashFlowClass::Purchase
    } else if op.is_expense {
        CashFlowClass::Expense
    } else if op.is_rent {
        CashFlowClass::Rent
    } else if matches!(op.kind, OperationKind::ProfitLoss | OperationKind::Other)
        && op.signed_cash_impact < Decimal::ZERO
    {
        CashFlowClass::Expense
    } else {
        CashFlowClass::Unclassified
    }
}

fn cash_out(op: &Operation) -> Decimal {
    if op.signed_cash_impact.is_zero() {
        (op.signed_quantity * op.unit_price).abs()
    } else {
        op.signed_cash_impact.abs()
    }
}

/// Builds the statistics of a non-fungible position as of `as_of`.
pub fn compute_real_estate_stat(
    position: &Position,
    as_of: DateTime<Utc>,
    rates: &ProjectionRates,
) -> RealEstateStat {
    let trailing_12m_start = months_before(as_of, 12);
    let trailing_30d_start = as_of - Duration::days(30);

    let mut total_purchase = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut rent_collected = Decimal::ZERO;
    let mut rent_ytd = Decimal::ZERO;
    let mut rent_trailing_12m = Decimal::ZERO;
    let mut rent_trailing_30d = Decimal::ZERO;
    let mut rent_months: BTreeSet<String> = BTreeSet::new();
    let mut trailing_months: BTreeSet<String> = BTreeSet::new();
    let mut first_purchase: Option<DateTime<Utc>> = None;

    for op in &position.operations {
        match classify(op) {
            CashFlowClass::Purchase => {
                total_purchase += cash_out(op);
                if let Some(date) = op.date {
                    first_purchase = Some(first_purchase.map_or(date, |d| d.min(date)));
                }
            }
            CashFlowClass::Expense => total_expenses += cash_out(op),
            CashFlowClass::Rent => {
                let amount = op.signed_cash_impact;
                rent_collected += amount;
                let Some(date) = op.date else { continue };
                if date > as_of {
                    continue;
                }
                rent_months.insert(month_key(date));
                if date.year() == as_of.year() {
                    rent_ytd += amount;
                }
                if date > trailing_12m_start {
                    rent_trailing_12m += amount;
                    trailing_months.insert(month_key(date));
                }
                if date > trailing_30d_start {
                    rent_trailing_30d += amount;
                }
            }
            CashFlowClass::Reinvestment | CashFlowClass::Unclassified => {}
        }
    }

    let final_asset_price = total_purchase + total_expenses;
    let outstanding = (final_asset_price - rent_collected).max(Decimal::ZERO);
    let utilization = if final_asset_price > Decimal::ZERO {
        (rent_collected.min(final_asset_price) / final_asset_price * dec!(100))
            .clamp(Decimal::ZERO, dec!(100))
    } else {
        Decimal::ZERO
    };

    let avg_monthly_rent = if trailing_months.is_empty() {
        Decimal::ZERO
    } else {
        rent_trailing_12m / Decimal::from(trailing_months.len())
    };
    let payoff_months = if outstanding.is_zero() {
        Some(Decimal::ZERO)
    } else if avg_monthly_rent > Decimal::ZERO {
        Some(outstanding / avg_monthly_rent)
    } else {
        None
    };

    let first_date = first_purchase.or_else(|| position.first_operation_date());
    let years_held = first_date
        .map(|start| years_between(start, as_of))
        .unwrap_or(Decimal::ZERO);
    let projection_years = years_held.max(Decimal::ONE);
    let projected_value = if position.category.depreciates() {
        (final_asset_price * (Decimal::ONE - rates.depreciation * projection_years))
            .max(Decimal::ZERO)
    } else {
        (Decimal::ONE + rates.appreciation)
            .checked_powd(projection_years)
            .and_then(|growth| final_asset_price.checked_mul(growth))
            .unwrap_or_else(|| {
                warn!(
                    "Projection of {} over {} years is out of range, keeping the asset price",
                    position.asset_key, projection_years
                );
                final_asset_price
            })
    };

    RealEstateStat {
        asset_key: position.asset_key.clone(),
        category: position.category,
        total_purchase,
        total_expenses,
        rent_collected,
        rent_ytd,
        rent_trailing_12m,
        rent_trailing_30d,
        rent_months: rent_months.into_iter().collect(),
        final_asset_price,
        outstanding,
        utilization,
        avg_monthly_rent,
        payoff_months,
        first_date,
        years_held,
        projected_value,
    }
}

/// Statistics for every non-fungible position.
pub fn compute_real_estate_stats(
    positions: &[Position],
    as_of: DateTime<Utc>,
    rates: &ProjectionRates,
) -> Vec<RealEstateStat> {
    positions
        .iter()
        .filter(|p| p.category.is_non_fungible())
        .map(|p| compute_real_estate_stat(p, as_of, rates))
        .collect()
}
