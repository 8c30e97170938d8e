//! Asset category model.

use ledgerfolio_market_data::InstrumentClass;
use serde::{Deserialize, Serialize};

use crate::constants::CASH_ASSET_NAME;

/// Canonical asset category.
///
/// The category decides the accounting method: lot-tracked categories use
/// FIFO lots, everything else uses weighted-average cost. Non-fungible
/// categories are valued at cost and analysed by cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetCategory {
    Stock,      // Listed equities, ETFs
    Crypto,     // Cryptocurrencies
    RealEstate, // Apartments, houses, land
    Automotive, // Cars and other vehicles, depreciating
    Cash,       // Cash reserves and deposits
    Other,      // A label outside the synonym table
    #[default]
    Unclassified, // Blank category
}

/// Synonym table: lowercase label -> canonical category.
const CATEGORY_SYNONYMS: &[(&str, AssetCategory)] = &[
    ("stock", AssetCategory::Stock),
    ("stocks", AssetCategory::Stock),
    ("equity", AssetCategory::Stock),
    ("etf", AssetCategory::Stock),
    ("share", AssetCategory::Stock),
    ("shares", AssetCategory::Stock),
    ("crypto", AssetCategory::Crypto),
    ("cryptocurrency", AssetCategory::Crypto),
    ("coin", AssetCategory::Crypto),
    ("real estate", AssetCategory::RealEstate),
    ("realestate", AssetCategory::RealEstate),
    ("property", AssetCategory::RealEstate),
    ("apartment", AssetCategory::RealEstate),
    ("house", AssetCategory::RealEstate),
    ("automotive", AssetCategory::Automotive),
    ("vehicle", AssetCategory::Automotive),
    ("car", AssetCategory::Automotive),
    ("auto", AssetCategory::Automotive),
    ("cash", AssetCategory::Cash),
    ("deposit", AssetCategory::Cash),
    ("savings", AssetCategory::Cash),
];

impl AssetCategory {
    /// Normalizes a raw category label.
    ///
    /// A blank label on an asset named `cash` is [`AssetCategory::Cash`];
    /// any other blank label is [`AssetCategory::Unclassified`].
    pub fn normalize(label: Option<&str>, asset: &str) -> Self {
        let key = label.map(|l| l.trim().to_lowercase()).unwrap_or_default();
        if key.is_empty() {
            return if asset.trim().eq_ignore_ascii_case(CASH_ASSET_NAME) {
                AssetCategory::Cash
            } else {
                AssetCategory::Unclassified
            };
        }
        CATEGORY_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, category)| *category)
            .unwrap_or(AssetCategory::Other)
    }

    /// FIFO lot accounting applies.
    pub const fn tracks_lots(&self) -> bool {
        matches!(self, AssetCategory::Stock | AssetCategory::Crypto)
    }

    /// Valued at cost and analysed by cash flow, never market-priced.
    pub const fn is_non_fungible(&self) -> bool {
        matches!(self, AssetCategory::RealEstate | AssetCategory::Automotive)
    }

    pub const fn depreciates(&self) -> bool {
        matches!(self, AssetCategory::Automotive)
    }

    /// Instrument class for quote routing; `None` for unquoted categories.
    pub const fn instrument_class(&self) -> Option<InstrumentClass> {
        match self {
            AssetCategory::Stock => Some(InstrumentClass::Equity),
            AssetCategory::Crypto => Some(InstrumentClass::Crypto),
            _ => None,
        }
    }

    /// Ticks for these categories arrive often enough to need coalescing.
    pub const fn is_high_frequency(&self) -> bool {
        matches!(self, AssetCategory::Crypto)
    }

    pub const fn group(&self) -> AssetGroup {
        match self {
            AssetCategory::Stock => AssetGroup::Stocks,
            AssetCategory::Crypto => AssetGroup::Crypto,
            AssetCategory::RealEstate | AssetCategory::Automotive => AssetGroup::RealAssets,
            AssetCategory::Cash => AssetGroup::Cash,
            AssetCategory::Other | AssetCategory::Unclassified => AssetGroup::Other,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AssetCategory::Stock => "Stock",
            AssetCategory::Crypto => "Crypto",
            AssetCategory::RealEstate => "Real Estate",
            AssetCategory::Automotive => "Automotive",
            AssetCategory::Cash => "Cash",
            AssetCategory::Other => "Other",
            AssetCategory::Unclassified => "Unclassified",
        }
    }
}

/// Top-level grouping used for totals and allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetGroup {
    Stocks,
    Crypto,
    RealAssets,
    Cash,
    Other,
}
