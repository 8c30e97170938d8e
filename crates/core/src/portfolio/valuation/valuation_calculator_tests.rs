//! Tests for position valuation.

#[cfg(test)]
mod tests {
    use crate::assets::AssetCategory;
    use crate::portfolio::positions::Position;
    use crate::portfolio::valuation::{
        apply_quote_to_position, resolve_price, revalue, Direction, PriceSource, QuoteStatus,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn stock(quantity: Decimal, cost_basis: Decimal) -> Position {
        let mut position = Position::new("AAPL", AssetCategory::Other, dec!(0.00000001));
        position.quantity = quantity;
        position.cost_basis = cost_basis;
        position
    }

    #[test]
    fn test_price_resolution_order() {
        let mut position = stock(dec!(10), dec!(1000));
        assert_eq!(resolve_price(&position), (dec!(100), PriceSource::AverageCost));

        position.last_purchase_price = dec!(110);
        assert_eq!(resolve_price(&position).1, PriceSource::LastPurchase);

        position.last_known_price = dec!(120);
        assert_eq!(resolve_price(&position).1, PriceSource::LastKnown);

        position.quote.live_price = Some(dec!(130));
        assert_eq!(resolve_price(&position), (dec!(130), PriceSource::Live));

        position.quote.display_price = Some(dec!(140));
        assert_eq!(resolve_price(&position), (dec!(140), PriceSource::Display));

        let empty = stock(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(resolve_price(&empty), (Decimal::ZERO, PriceSource::None));
    }

    #[test]
    fn test_market_value_and_pnl() {
        let mut position = stock(dec!(10), dec!(1000));
        position.realized = dec!(50);
        position.reinvested_quantity = dec!(1);
        assert!(apply_quote_to_position(&mut position, Some(dec!(150)), Some(dec!(140)), "FINNHUB", Utc::now()));

        let v = &position.valuation;
        assert_eq!(v.market_value, dec!(1500));
        assert_eq!(v.unrealized, dec!(500));
        assert_eq!(v.reinvested_value, dec!(150));
        assert_eq!(v.pnl, dec!(700));
        assert_eq!(v.change, dec!(10));
        assert_eq!(v.change_percent.round_dp(4), dec!(7.1429));
        assert_eq!(position.quote.status, QuoteStatus::Live);
        assert_eq!(position.last_known_price, dec!(150));
    }

    #[test]
    fn test_daily_change_falls_back_to_average_cost() {
        let mut position = stock(dec!(4), dec!(400));
        apply_quote_to_position(&mut position, Some(dec!(110)), None, "YAHOO", Utc::now());
        assert_eq!(position.valuation.change, dec!(10));
        assert_eq!(position.valuation.change_percent, dec!(10));
    }

    #[test]
    fn test_non_fungible_valued_at_cost() {
        let mut flat = Position::new("Flat", AssetCategory::RealEstate, dec!(0.00000001));
        flat.quantity = dec!(1);
        flat.cost_basis = dec!(200000);
        flat.realized = dec!(-500);

        for price in [dec!(1), dec!(250000), dec!(999999)] {
            apply_quote_to_position(&mut flat, Some(price), None, "TEST", Utc::now());
            assert_eq!(flat.valuation.market_value, dec!(200000));
            assert_eq!(flat.valuation.unrealized, Decimal::ZERO);
            assert_eq!(flat.valuation.pnl, dec!(-500));
        }
    }

    #[test]
    fn test_invalid_quote_keeps_last_known_price() {
        let mut position = stock(dec!(2), dec!(200));
        apply_quote_to_position(&mut position, Some(dec!(120)), None, "FINNHUB", Utc::now());

        assert!(!apply_quote_to_position(&mut position, Some(dec!(-1)), None, "FINNHUB", Utc::now()));
        assert!(!apply_quote_to_position(&mut position, None, None, "FINNHUB", Utc::now()));

        assert_eq!(position.quote.status, QuoteStatus::Unavailable);
        assert_eq!(position.valuation.price, dec!(120));
        assert_eq!(position.valuation.price_source, PriceSource::LastKnown);
        assert_eq!(position.valuation.market_value, dec!(240));
    }

    #[test]
    fn test_direction_tracks_previous_valuation() {
        let mut position = stock(dec!(1), dec!(100));
        revalue(&mut position);
        assert_eq!(position.valuation.market_direction, None);

        apply_quote_to_position(&mut position, Some(dec!(105)), None, "T", Utc::now());
        assert_eq!(position.valuation.price_direction, Some(Direction::Up));
        assert_eq!(position.valuation.market_direction, Some(Direction::Up));

        apply_quote_to_position(&mut position, Some(dec!(101)), None, "T", Utc::now());
        assert_eq!(position.valuation.price_direction, Some(Direction::Down));

        apply_quote_to_position(&mut position, Some(dec!(101)), None, "T", Utc::now());
        assert_eq!(position.valuation.price_direction, None);
    }
}
