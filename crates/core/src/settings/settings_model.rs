use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::portfolio::range::PnlRange;

/// Lower bound of the worker pool size.
pub const MIN_CONCURRENCY: usize = 3;

/// Upper bound of the worker pool size.
pub const MAX_CONCURRENCY: usize = 6;

/// Tunables for the engine. Every field has a default, so a partial JSON
/// object deserializes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Minimum interval between two renders.
    pub render_interval_ms: u64,
    /// Coalescing window for high-frequency (crypto) ticks.
    pub coalesce_window_ms: u64,
    /// Worker pool size for quote and history fetches.
    pub concurrency: usize,
    /// Initially selected range window.
    pub window: PnlRange,
    /// Years in the short net-worth projection.
    pub short_projection_years: u32,
    /// Hard cap of the extended projection.
    pub projection_horizon_years: u32,
    /// Yearly growth of the net-worth projection.
    pub growth_rate: Decimal,
    /// Net-worth milestone to estimate a date for.
    pub wealth_milestone: Decimal,
    /// Yearly appreciation of non-depreciating real assets.
    pub appreciation_rate: Decimal,
    /// Yearly depreciation of vehicles, as a fraction of the final asset price.
    pub depreciation_rate: Decimal,
    /// Quantities below this are treated as zero.
    pub quantity_epsilon: Decimal,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            render_interval_ms: 5_000,
            coalesce_window_ms: 1_000,
            concurrency: 5,
            window: PnlRange::All,
            short_projection_years: 2,
            projection_horizon_years: 40,
            growth_rate: dec!(0.10),
            wealth_milestone: dec!(1000000),
            appreciation_rate: dec!(0.05),
            depreciation_rate: dec!(0.004),
            quantity_epsilon: dec!(0.00000001),
        }
    }
}

impl EngineSettings {
    /// Pool size clamped to the supported range.
    pub fn concurrency(&self) -> usize {
        self.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_is_clamped() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.concurrency(), 5);

        settings.concurrency = 1;
        assert_eq!(settings.concurrency(), MIN_CONCURRENCY);

        settings.concurrency = 32;
        assert_eq!(settings.concurrency(), MAX_CONCURRENCY);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"concurrency": 4, "window": "1M"}"#).unwrap();
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.window, PnlRange::OneMonth);
        assert_eq!(settings.render_interval_ms, 5_000);
        assert_eq!(settings.wealth_milestone, dec!(1000000));
    }
}
