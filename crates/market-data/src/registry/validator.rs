//! Quote validation.
//!
//! A price that is non-positive or non-finite is "unavailable": the quote is
//! rejected and the next tier is tried.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::QuoteSnapshot;

/// Upper sanity bound on a unit price.
const MAX_PRICE: i64 = 1_000_000_000;

/// Converts a raw provider float into a usable price.
///
/// ```
/// use ledgerfolio_market_data::registry::price_from_f64;
///
/// assert!(price_from_f64(12.5).is_some());
/// assert!(price_from_f64(0.0).is_none());
/// assert!(price_from_f64(f64::NAN).is_none());
/// ```
pub fn price_from_f64(raw: f64) -> Option<Decimal> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    Decimal::from_f64(raw).filter(|p| *p > Decimal::ZERO)
}

/// Rejects quotes whose price cannot be used for valuation.
pub fn validate_quote(quote: &QuoteSnapshot) -> Result<(), MarketDataError> {
    if quote.price <= Decimal::ZERO {
        return Err(MarketDataError::PriceUnavailable {
            symbol: quote.symbol.clone(),
            reason: format!("non-positive price {}", quote.price),
        });
    }
    if quote.price > Decimal::from(MAX_PRICE) {
        return Err(MarketDataError::PriceUnavailable {
            symbol: quote.symbol.clone(),
            reason: format!("price {} above sanity bound", quote.price),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn quote(price: Decimal) -> QuoteSnapshot {
        QuoteSnapshot::new("AAPL", price, None, Utc::now(), "TEST")
    }

    #[test]
    fn test_price_from_f64_rejects_unusable() {
        assert_eq!(price_from_f64(-3.0), None);
        assert_eq!(price_from_f64(f64::INFINITY), None);
        assert_eq!(price_from_f64(101.25), Some(dec!(101.25)));
    }

    #[test]
    fn test_validate_quote() {
        assert!(validate_quote(&quote(dec!(10))).is_ok());
        assert!(matches!(
            validate_quote(&quote(dec!(0))),
            Err(MarketDataError::PriceUnavailable { .. })
        ));
        assert!(validate_quote(&quote(dec!(2000000000))).is_err());
    }
}
