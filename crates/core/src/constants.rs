/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Display name used for cash positions
pub const CASH_DISPLAY_NAME: &str = "Cash Reserve";

/// Asset name that is treated as cash when the category is blank
pub const CASH_ASSET_NAME: &str = "cash";

/// Days per year used for holding-period projections
pub const DAYS_PER_YEAR: &str = "365.25";

/// Extra history fetched before a window start so the first candle exists
pub const HISTORY_PADDING_SECS: i64 = 3600;

/// Largest magnitude accepted for a ledger amount, price, cash value or
/// derived unit cost
pub const MAX_LEDGER_MAGNITUDE: i64 = 1_000_000_000_000;
