//! Tests for the asset category model.

#[cfg(test)]
mod tests {
    use crate::assets::{AssetCategory, AssetGroup};
    use ledgerfolio_market_data::InstrumentClass;

    #[test]
    fn test_synonyms_collapse_to_one_category() {
        for label in ["automotive", "Vehicle", " CAR ", "auto"] {
            assert_eq!(
                AssetCategory::normalize(Some(label), "Family car"),
                AssetCategory::Automotive,
                "label {label}"
            );
        }
        assert_eq!(
            AssetCategory::normalize(Some("Real Estate"), "Flat"),
            AssetCategory::RealEstate
        );
        assert_eq!(
            AssetCategory::normalize(Some("deposit"), "Savings"),
            AssetCategory::Cash
        );
    }

    #[test]
    fn test_blank_category() {
        assert_eq!(AssetCategory::normalize(None, "Cash"), AssetCategory::Cash);
        assert_eq!(AssetCategory::normalize(Some("  "), "cash"), AssetCategory::Cash);
        assert_eq!(
            AssetCategory::normalize(None, "AAPL"),
            AssetCategory::Unclassified
        );
    }

    #[test]
    fn test_unknown_label_is_other() {
        assert_eq!(
            AssetCategory::normalize(Some("Wine collection"), "Bordeaux"),
            AssetCategory::Other
        );
    }

    #[test]
    fn test_accounting_flags() {
        assert!(AssetCategory::Stock.tracks_lots());
        assert!(AssetCategory::Crypto.tracks_lots());
        assert!(!AssetCategory::RealEstate.tracks_lots());
        assert!(AssetCategory::RealEstate.is_non_fungible());
        assert!(AssetCategory::Automotive.depreciates());
        assert!(!AssetCategory::Cash.is_non_fungible());
        assert_eq!(
            AssetCategory::Crypto.instrument_class(),
            Some(InstrumentClass::Crypto)
        );
        assert_eq!(AssetCategory::Cash.instrument_class(), None);
        assert_eq!(AssetCategory::Automotive.group(), AssetGroup::RealAssets);
    }
}
