use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Movement of a value compared with its previous observation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `None` when the value did not move.
    pub fn between(previous: Decimal, current: Decimal) -> Option<Self> {
        if current > previous {
            Some(Direction::Up)
        } else if current < previous {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Live,
    /// The last quote was rejected; the last known price is still used.
    Unavailable,
}

/// Where the price used for valuation came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    Display,
    Live,
    LastKnown,
    LastPurchase,
    AverageCost,
    #[default]
    None,
}

/// Live quote state of a position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PositionQuote {
    /// Pinned price that overrides every other source.
    pub display_price: Option<Decimal>,
    pub live_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub source: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub status: QuoteStatus,
}

/// Derived valuation of a position at its resolved price.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub price: Decimal,
    pub price_source: PriceSource,
    pub market_value: Decimal,
    pub unrealized: Decimal,
    pub reinvested_value: Decimal,
    pub pnl: Decimal,
    /// Daily change against the previous close.
    pub change: Decimal,
    pub change_percent: Decimal,
    pub market_direction: Option<Direction>,
    pub price_direction: Option<Direction>,
}
