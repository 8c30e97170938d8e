//! Position valuation at a resolved price.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::valuation_model::{
    Direction, PositionValuation, PriceSource, QuoteStatus,
};
use crate::portfolio::positions::Position;

/// Resolves the valuation price: display price, live quote, last known,
/// last purchase, weighted-average cost, then zero.
pub fn resolve_price(position: &Position) -> (Decimal, PriceSource) {
    let positive = |value: Option<Decimal>| value.filter(|v| *v > Decimal::ZERO);

    let candidates = [
        (positive(position.quote.display_price), PriceSource::Display),
        (positive(position.quote.live_price), PriceSource::Live),
        (positive(Some(position.last_known_price)), PriceSource::LastKnown),
        (positive(Some(position.last_purchase_price)), PriceSource::LastPurchase),
        (positive(Some(position.average_cost())), PriceSource::AverageCost),
    ];
    candidates
        .into_iter()
        .find_map(|(price, source)| price.map(|p| (p, source)))
        .unwrap_or((Decimal::ZERO, PriceSource::None))
}

/// Recomputes the valuation of `position` in place and records the price and
/// market value directions against the previous valuation.
pub fn revalue(position: &mut Position) {
    let previous = position.valuation.clone();
    let (price, price_source) = resolve_price(position);

    let mut market_value = position.quantity.checked_mul(price).unwrap_or_else(|| {
        warn!(
            "Market value of {} at {} is out of range",
            position.asset_key, price
        );
        Decimal::ZERO
    });
    let mut unrealized = market_value - position.cost_basis;
    let reinvested_value = position
        .reinvested_quantity
        .checked_mul(price)
        .unwrap_or(Decimal::ZERO);
    let mut pnl = unrealized + position.realized + reinvested_value;

    if position.category.is_non_fungible() {
        market_value = position.cost_basis.abs();
        unrealized = Decimal::ZERO;
        pnl = if position.has_rent() {
            position.rent_realized
        } else {
            position.realized
        };
    }

    let reference = [
        position.quote.previous_close,
        Some(position.average_cost()),
        Some(position.last_known_price),
    ]
    .into_iter()
    .flatten()
    .find(|v| *v > Decimal::ZERO);
    let (change, change_percent) = match reference {
        Some(reference) if price > Decimal::ZERO => {
            let change = price - reference;
            (change, change / reference * dec!(100))
        }
        _ => (Decimal::ZERO, Decimal::ZERO),
    };

    let had_value = previous.price_source != PriceSource::None;
    position.valuation = PositionValuation {
        price,
        price_source,
        market_value,
        unrealized,
        reinvested_value,
        pnl,
        change,
        change_percent,
        market_direction: if had_value {
            Direction::between(previous.market_value, market_value)
        } else {
            None
        },
        price_direction: if had_value {
            Direction::between(previous.price, price)
        } else {
            None
        },
    };
}

/// Applies a quote tick. Returns `false` when the price was rejected; the
/// position then keeps its last known price and is marked unavailable.
///
/// Applying the same tick twice leaves the position unchanged apart from
/// the direction markers settling to `None`.
pub fn apply_quote_to_position(
    position: &mut Position,
    price: Option<Decimal>,
    previous_close: Option<Decimal>,
    source: &str,
    at: DateTime<Utc>,
) -> bool {
    let Some(price) = price.filter(|p| *p > Decimal::ZERO) else {
        debug!(
            "Rejected quote for {} from {}; keeping last known {}",
            position.asset_key, source, position.last_known_price
        );
        position.quote.status = QuoteStatus::Unavailable;
        position.quote.live_price = None;
        revalue(position);
        return false;
    };

    position.quote.live_price = Some(price);
    if let Some(close) = previous_close.filter(|c| *c > Decimal::ZERO) {
        position.quote.previous_close = Some(close);
    }
    position.quote.source = Some(source.to_string());
    position.quote.updated_at = Some(at);
    position.quote.status = QuoteStatus::Live;
    position.last_known_price = price;
    revalue(position);
    true
}
