//! Lazy, batched range P&L recomputation.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::baseline_cache::BaselineCache;
use super::range_model::{PnlRange, RangeMetrics, RangeTotal, RangeTotals};
use crate::portfolio::positions::Position;
use crate::portfolio::valuation::Direction;

/// Owns the selected window, the baseline cache and the dirty flag.
///
/// Price ticks and window switches only mark the engine dirty; the next
/// [`RangeEngine::recompute_if_dirty`] recomputes every position once.
#[derive(Debug, Clone)]
pub struct RangeEngine {
    window: PnlRange,
    baselines: BaselineCache,
    dirty: bool,
    switch_in_flight: bool,
    totals: Option<RangeTotals>,
}

impl RangeEngine {
    pub fn new(window: PnlRange) -> Self {
        Self {
            window,
            baselines: BaselineCache::new(),
            dirty: true,
            switch_in_flight: false,
            totals: None,
        }
    }

    pub fn window(&self) -> PnlRange {
        self.window
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn totals(&self) -> Option<&RangeTotals> {
        self.totals.as_ref()
    }

    pub fn baselines(&self) -> &BaselineCache {
        &self.baselines
    }

    pub fn is_switch_in_flight(&self) -> bool {
        self.switch_in_flight
    }

    /// Starts a window switch. Returns `false` while another switch is in
    /// flight; the request is then dropped.
    pub fn begin_switch(&mut self, window: PnlRange) -> bool {
        if self.switch_in_flight {
            warn!("Window switch to {} ignored, another switch is in flight", window);
            return false;
        }
        self.switch_in_flight = true;
        self.window = window;
        self.dirty = true;
        true
    }

    pub fn finish_switch(&mut self) {
        self.switch_in_flight = false;
        self.dirty = true;
    }

    /// Whether a history fetch is needed to find this position's baseline in
    /// the current window.
    pub fn needs_history(&self, position: &Position) -> bool {
        self.window.uses_history()
            && !position.category.is_non_fungible()
            && position.symbol.is_some()
            && !self.baselines.contains(position.baseline_key(), self.window)
    }

    /// Stores a fetched baseline. Late results for a key that is already
    /// cached are ignored.
    pub fn store_baseline(&mut self, key: &str, window: PnlRange, price: Decimal) -> bool {
        let stored = self.baselines.insert_if_absent(key, window, price);
        if stored && window == self.window {
            self.dirty = true;
        } else if !stored {
            debug!("Ignoring baseline {} for {} {}", price, key, window);
        }
        stored
    }

    /// Baseline price of `position` in the current window.
    pub fn baseline_for(&self, position: &Position) -> Decimal {
        let avg = position.average_cost();
        let fallback = [avg, position.last_known_price, position.valuation.price]
            .into_iter()
            .find(|p| *p > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);

        match self.window {
            PnlRange::All => avg,
            PnlRange::OneDay => position
                .quote
                .previous_close
                .filter(|c| *c > Decimal::ZERO)
                .unwrap_or(fallback),
            window => self
                .baselines
                .get(position.baseline_key(), window)
                .unwrap_or(fallback),
        }
    }

    /// Recomputes when dirty. Returns whether a recompute happened.
    pub fn recompute_if_dirty(&mut self, positions: &mut [Position], as_of: DateTime<Utc>) -> bool {
        if !self.dirty {
            return false;
        }
        self.recompute(positions, as_of);
        true
    }

    /// Recomputes every position's metrics and the totals, clearing the dirty
    /// flag.
    pub fn recompute(&mut self, positions: &mut [Position], as_of: DateTime<Utc>) -> &RangeTotals {
        let mut by_group: BTreeMap<_, RangeTotal> = BTreeMap::new();
        let mut overall = RangeTotal::default();

        for position in positions.iter_mut() {
            let metrics = self.metrics_for(position, as_of);
            let group = by_group.entry(position.category.group()).or_default();
            group.pnl += metrics.pnl;
            group.base_value += metrics.base_value;
            overall.pnl += metrics.pnl;
            overall.base_value += metrics.base_value;
            position.range = Some(metrics);
        }

        for total in by_group.values_mut().chain(std::iter::once(&mut overall)) {
            total.change_percent = percent(total.pnl, total.base_value);
        }

        self.dirty = false;
        self.totals.insert(RangeTotals {
            window: self.window,
            by_group,
            overall,
        })
    }

    fn metrics_for(&self, position: &Position, as_of: DateTime<Utc>) -> RangeMetrics {
        let baseline_price = self.baseline_for(position);
        let price = position.valuation.price;

        let pnl = if position.category.is_non_fungible() {
            self.rent_in_window(position, as_of)
        } else {
            (price - baseline_price) * position.quantity
                + position.realized
                + position.valuation.reinvested_value
        };

        let base_value = [
            baseline_price * position.quantity,
            position.invested.abs(),
            position.realized.abs(),
        ]
        .into_iter()
        .find(|v| !v.is_zero())
        .unwrap_or(Decimal::ONE);

        let direction = position
            .range
            .as_ref()
            .and_then(|previous| Direction::between(previous.pnl, pnl));

        RangeMetrics {
            window: self.window,
            baseline_price,
            pnl,
            change_percent: percent(pnl, base_value),
            base_value,
            direction,
        }
    }

    /// Rent collected inside the window, or all rent for `ALL`.
    fn rent_in_window(&self, position: &Position, as_of: DateTime<Utc>) -> Decimal {
        let cutoff = self.window.lookback().map(|lookback| as_of - lookback);
        position
            .operations
            .iter()
            .filter(|op| op.is_rent)
            .filter(|op| match (cutoff, op.date) {
                (None, _) => true,
                (Some(cutoff), Some(date)) => date >= cutoff && date <= as_of,
                (Some(_), None) => false,
            })
            .map(|op| op.signed_cash_impact)
            .sum()
    }
}

fn percent(pnl: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        Decimal::ZERO
    } else {
        pnl / base.abs() * dec!(100)
    }
}
