//! Tests for real-asset cash-flow analytics.

#[cfg(test)]
mod tests {
    use crate::assets::AssetCategory;
    use crate::operations::{Operation, OperationKind};
    use crate::portfolio::positions::PositionAggregator;
    use crate::portfolio::real_estate::{
        classify, compute_real_estate_stat, compute_real_estate_stats, CashFlowClass,
        ProjectionRates,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn rates() -> ProjectionRates {
        ProjectionRates {
            appreciation: dec!(0.05),
            depreciation: dec!(0.004),
        }
    }

    fn op(
        id: &str,
        asset: &str,
        category: AssetCategory,
        kind: OperationKind,
        quantity: Decimal,
        cash: Decimal,
        date: DateTime<Utc>,
        tags: &[&str],
    ) -> Operation {
        let tags: BTreeSet<String> = tags.iter().map(|t| t.to_string()).collect();
        Operation {
            id: id.to_string(),
            asset_key: asset.to_string(),
            category,
            kind,
            date: Some(date),
            signed_quantity: quantity,
            unit_price: Decimal::ZERO,
            signed_cash_impact: cash,
            is_reinvestment: tags.contains("reinvesting"),
            is_rent: kind == OperationKind::ProfitLoss && tags.contains("rent"),
            is_expense: tags.contains("repair"),
            tags,
        }
    }

    fn flat_operations(as_of: DateTime<Utc>) -> Vec<Operation> {
        let mut ops = vec![
            op("buy", "Flat", AssetCategory::RealEstate, OperationKind::Trade, dec!(1), dec!(200000), as_of - Duration::days(300), &[]),
            op("fix", "Flat", AssetCategory::RealEstate, OperationKind::Other, Decimal::ZERO, dec!(-10000), as_of - Duration::days(250), &["repair"]),
        ];
        for month in 6..=11 {
            ops.push(op(
                &format!("rent-{month}"),
                "Flat",
                AssetCategory::RealEstate,
                OperationKind::ProfitLoss,
                Decimal::ZERO,
                dec!(2500),
                Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap(),
                &["rent"],
            ));
        }
        ops
    }

    #[test]
    fn test_rental_scenario() {
        let as_of = Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap();
        let positions = PositionAggregator::new(dec!(0.00000001)).aggregate(&flat_operations(as_of));
        let stat = compute_real_estate_stat(&positions[0], as_of, &rates());

        assert_eq!(stat.total_purchase, dec!(200000));
        assert_eq!(stat.total_expenses, dec!(10000));
        assert_eq!(stat.rent_collected, dec!(15000));
        assert_eq!(stat.final_asset_price, dec!(210000));
        assert_eq!(stat.outstanding, dec!(195000));
        assert_eq!(stat.utilization.round_dp(2), dec!(7.14));
        assert_eq!(stat.avg_monthly_rent, dec!(2500));
        assert_eq!(stat.payoff_months, Some(dec!(78)));
        assert_eq!(stat.rent_ytd, dec!(15000));
        assert_eq!(stat.rent_trailing_12m, dec!(15000));
        assert_eq!(stat.rent_trailing_30d, Decimal::ZERO);
        assert_eq!(stat.rent_months.len(), 6);
        assert_eq!(stat.rent_months[0], "2024-06");
        // Held under a year: one full year of appreciation
        assert_eq!(stat.projected_value.round_dp(2), dec!(220500));
    }

    #[test]
    fn test_classification() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let flat = AssetCategory::RealEstate;
        assert_eq!(classify(&op("1", "F", flat, OperationKind::Trade, dec!(1), dec!(10), at, &[])), CashFlowClass::Purchase);
        assert_eq!(classify(&op("2", "F", flat, OperationKind::Trade, dec!(1), dec!(10), at, &["repair"])), CashFlowClass::Expense);
        assert_eq!(classify(&op("3", "F", flat, OperationKind::ProfitLoss, Decimal::ZERO, dec!(-10), at, &[])), CashFlowClass::Expense);
        assert_eq!(classify(&op("4", "F", flat, OperationKind::ProfitLoss, Decimal::ZERO, dec!(10), at, &["rent"])), CashFlowClass::Rent);
        assert_eq!(classify(&op("5", "F", flat, OperationKind::ProfitLoss, Decimal::ZERO, dec!(10), at, &["reinvesting", "rent"])), CashFlowClass::Reinvestment);
        assert_eq!(classify(&op("6", "F", flat, OperationKind::DepositWithdrawal, Decimal::ZERO, dec!(-10), at, &[])), CashFlowClass::Unclassified);
    }

    #[test]
    fn test_paid_off_and_no_rent() {
        let as_of = Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap();
        let ops = vec![
            op("b", "Garage", AssetCategory::RealEstate, OperationKind::Trade, dec!(1), dec!(1000), as_of - Duration::days(400), &[]),
            op("r", "Garage", AssetCategory::RealEstate, OperationKind::ProfitLoss, Decimal::ZERO, dec!(1500), as_of - Duration::days(10), &["rent"]),
            op("c", "Cabin", AssetCategory::RealEstate, OperationKind::Trade, dec!(1), dec!(5000), as_of - Duration::days(10), &[]),
        ];
        let positions = PositionAggregator::new(dec!(0.00000001)).aggregate(&ops);
        let stats = compute_real_estate_stats(&positions, as_of, &rates());

        assert_eq!(stats[0].outstanding, Decimal::ZERO);
        assert_eq!(stats[0].utilization, dec!(100));
        assert_eq!(stats[0].payoff_months, Some(Decimal::ZERO));

        assert_eq!(stats[1].avg_monthly_rent, Decimal::ZERO);
        assert_eq!(stats[1].payoff_months, None);
        assert_eq!(stats[1].utilization, Decimal::ZERO);
    }

    #[test]
    fn test_vehicle_depreciation() {
        let as_of = Utc.with_ymd_and_hms(2024, 12, 15, 0, 0, 0).unwrap();
        let ops = vec![op(
            "car",
            "Car",
            AssetCategory::Automotive,
            OperationKind::Trade,
            dec!(1),
            dec!(20000),
            as_of - Duration::days(1461),
            &[],
        )];
        let positions = PositionAggregator::new(dec!(0.00000001)).aggregate(&ops);
        let stat = compute_real_estate_stat(&positions[0], as_of, &rates());
        assert_eq!(stat.years_held, dec!(4));
        assert_eq!(stat.projected_value, dec!(19680));
    }

    #[test]
    fn test_projection_out_of_range_keeps_asset_price() {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let bought = Utc.with_ymd_and_hms(202, 5, 1, 0, 0, 0).unwrap();
        let ops = vec![op(
            "old",
            "Villa",
            AssetCategory::RealEstate,
            OperationKind::Trade,
            dec!(1),
            dec!(200000),
            bought,
            &[],
        )];
        let positions = PositionAggregator::new(dec!(0.00000001)).aggregate(&ops);
        let stat = compute_real_estate_stat(&positions[0], as_of, &rates());
        assert!(stat.years_held > dec!(1800));
        assert_eq!(stat.final_asset_price, dec!(200000));
        assert_eq!(stat.projected_value, dec!(200000));
    }
}
