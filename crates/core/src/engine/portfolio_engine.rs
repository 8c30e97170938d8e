//! The engine object owning positions, range state and render throttling.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use ledgerfolio_market_data::{earliest_close, HistoryRegistry, QuoteRegistry, QuoteSnapshot};

use super::csv_export::export_positions_csv;
use super::dashboard_model::{AllocationSlice, Dashboard, PositionRow};
use super::render_scheduler::{RenderDecision, RenderRequest, RenderScheduler};
use crate::assets::AssetCategory;
use crate::constants::HISTORY_PADDING_SECS;
use crate::errors::Result;
use crate::ledger::{LedgerMeta, TieredLedgerLoader};
use crate::operations::{normalize_records, LedgerRecord, Operation};
use crate::portfolio::{
    apply_quote_to_position, build_net_worth_timeline, compute_real_estate_stats, revalue,
    NetWorthTimeline, PnlRange, Position, PositionAggregator, ProjectionRates,
    ProjectionSettings, QuoteStatus, RangeEngine, RealEstateStat,
};
use crate::settings::EngineSettings;

/// Owns every position of one session.
///
/// Positions are rebuilt from scratch by [`PortfolioEngine::load_records`];
/// quotes and window switches then mutate them in place.
pub struct PortfolioEngine {
    settings: EngineSettings,
    operations: Vec<Operation>,
    positions: Vec<Position>,
    by_asset: HashMap<String, usize>,
    /// Several assets can map to one quote symbol.
    by_symbol: HashMap<String, Vec<usize>>,
    range: RangeEngine,
    scheduler: RenderScheduler,
    ledger_meta: Option<LedgerMeta>,
    quotes: Option<Arc<QuoteRegistry>>,
    history: Option<Arc<HistoryRegistry>>,
}

impl PortfolioEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let range = RangeEngine::new(settings.window);
        let scheduler = RenderScheduler::new(settings.render_interval(), settings.coalesce_window());
        Self {
            settings,
            operations: Vec::new(),
            positions: Vec::new(),
            by_asset: HashMap::new(),
            by_symbol: HashMap::new(),
            range,
            scheduler,
            ledger_meta: None,
            quotes: None,
            history: None,
        }
    }

    pub fn with_quote_registry(mut self, registry: Arc<QuoteRegistry>) -> Self {
        self.quotes = Some(registry);
        self
    }

    pub fn with_history_registry(mut self, registry: Arc<HistoryRegistry>) -> Self {
        self.history = Some(registry);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, asset_key: &str) -> Option<&Position> {
        self.by_asset.get(asset_key).map(|&i| &self.positions[i])
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn window(&self) -> PnlRange {
        self.range.window()
    }

    pub fn range_engine(&self) -> &RangeEngine {
        &self.range
    }

    pub fn ledger_meta(&self) -> Option<&LedgerMeta> {
        self.ledger_meta.as_ref()
    }

    /// Loads through the ledger tiers and rebuilds every position.
    pub async fn reload(&mut self, loader: &TieredLedgerLoader) -> Result<LedgerMeta> {
        let load = loader.load().await?;
        let meta = load.meta();
        self.load_records(&load.records, Some(meta.clone()));
        Ok(meta)
    }

    /// Rebuilds positions from raw records. Unparseable rows are dropped.
    pub fn load_records(&mut self, records: &[LedgerRecord], meta: Option<LedgerMeta>) {
        let operations = normalize_records(records);
        let aggregator = PositionAggregator::new(self.settings.quantity_epsilon);
        let mut positions = aggregator.aggregate(&operations);
        for position in positions.iter_mut() {
            revalue(position);
        }

        self.by_asset = positions
            .iter()
            .enumerate()
            .map(|(i, p)| (p.asset_key.clone(), i))
            .collect();
        let mut by_symbol: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, position) in positions.iter().enumerate() {
            if let Some(symbol) = &position.symbol {
                by_symbol.entry(symbol.clone()).or_default().push(i);
            }
        }
        self.by_symbol = by_symbol;

        info!(
            "Rebuilt {} positions from {} of {} ledger records",
            positions.len(),
            operations.len(),
            records.len()
        );
        self.operations = operations;
        self.positions = positions;
        self.ledger_meta = meta;
        self.range.mark_dirty();
        // A render scheduled for the previous positions is stale.
        self.scheduler.cancel();
    }

    fn indices_of(&self, key: &str) -> Vec<usize> {
        match self.by_symbol.get(key) {
            Some(indices) => indices.clone(),
            None => self.by_asset.get(key).copied().into_iter().collect(),
        }
    }

    /// Applies a price to every position quoted under `symbol` (or the
    /// position with that asset key) and requests a render. Returns `false`
    /// for unknown symbols and rejected prices.
    pub fn apply_quote(
        &mut self,
        symbol: &str,
        price: Option<Decimal>,
        previous_close: Option<Decimal>,
        source: &str,
        now: Instant,
    ) -> bool {
        let indices = self.indices_of(symbol);
        if indices.is_empty() {
            debug!("Quote for unknown symbol {}", symbol);
            return false;
        }

        let at = Utc::now();
        let mut accepted = false;
        let mut request = RenderRequest::Normal;
        for index in indices {
            let position = &mut self.positions[index];
            accepted |= apply_quote_to_position(position, price, previous_close, source, at);
            if position.category.is_high_frequency() {
                request = RenderRequest::HighFrequency;
            }
        }
        self.range.mark_dirty();
        self.scheduler.request(request, now);
        accepted
    }

    pub fn apply_snapshot(&mut self, quote: &QuoteSnapshot, now: Instant) -> bool {
        self.apply_quote(
            &quote.symbol,
            Some(quote.price),
            quote.previous_close,
            &quote.source,
            now,
        )
    }

    /// Applies a streamed tick and keeps it in the registry's stream cache.
    pub fn apply_stream_tick(&mut self, quote: QuoteSnapshot, now: Instant) -> bool {
        if let Some(registry) = &self.quotes {
            registry.record_tick(quote.clone());
        }
        self.apply_snapshot(&quote, now)
    }

    /// Pins a display price on a position; `None` removes the pin.
    pub fn set_display_price(&mut self, asset_key: &str, price: Option<Decimal>) -> bool {
        let Some(&index) = self.by_asset.get(asset_key) else {
            return false;
        };
        let position = &mut self.positions[index];
        position.quote.display_price = price.filter(|p| *p > Decimal::ZERO);
        revalue(position);
        self.range.mark_dirty();
        true
    }

    /// Fetches snapshot quotes for every quotable position through the quote
    /// registry. Returns the number of accepted quotes.
    pub async fn preload_quotes(&mut self) -> usize {
        let Some(registry) = self.quotes.clone() else {
            return 0;
        };
        let mut seen = HashSet::new();
        let contexts: Vec<_> = self
            .positions
            .iter()
            .filter_map(Position::quote_context)
            .filter(|context| seen.insert(context.symbol.clone()))
            .collect();
        if contexts.is_empty() {
            return 0;
        }

        let results = registry
            .fetch_snapshots(&contexts, self.settings.concurrency())
            .await;
        let now = Instant::now();
        let mut accepted = 0;
        for (context, result) in results {
            match result {
                Ok(quote) => {
                    if self.apply_quote(
                        &context.symbol,
                        Some(quote.price),
                        quote.previous_close,
                        &quote.source,
                        now,
                    ) {
                        accepted += 1;
                    }
                }
                Err(e) => {
                    warn!("No quote for {}: {}", context.symbol, e);
                    self.apply_quote(&context.symbol, None, None, "none", now);
                }
            }
        }
        info!("Preloaded {} of {} quotes", accepted, contexts.len());
        accepted
    }

    /// First half of a window switch. Returns `false` while another switch
    /// is in flight.
    pub fn begin_window_switch(&mut self, window: PnlRange) -> bool {
        self.range.begin_switch(window)
    }

    /// Second half of a window switch: stores fetched baselines keyed by
    /// baseline key and releases the switch guard.
    pub fn complete_window_switch(&mut self, window: PnlRange, baselines: Vec<(String, Decimal)>) {
        for (key, price) in baselines {
            self.range.store_baseline(&key, window, price);
        }
        self.range.finish_switch();
    }

    /// Switches the window, fetching missing baselines through the history
    /// registry with a bounded pool, then recomputes.
    pub async fn set_window(&mut self, window: PnlRange, as_of: DateTime<Utc>) -> bool {
        if !self.begin_window_switch(window) {
            return false;
        }

        let mut baselines: Vec<(String, Decimal)> = Vec::new();
        if let (Some(registry), Some(lookback)) = (self.history.clone(), window.lookback()) {
            let start = as_of - lookback - Duration::seconds(HISTORY_PADDING_SECS);
            let mut pending: BTreeMap<String, _> = BTreeMap::new();
            for position in self.positions.iter().filter(|p| self.range.needs_history(p)) {
                if let Some(context) = position.quote_context() {
                    pending.insert(position.baseline_key().to_string(), context);
                }
            }

            baselines = stream::iter(pending)
                .map(|(key, context)| {
                    let registry = registry.clone();
                    async move {
                        match registry.fetch_history(&context, start, as_of).await {
                            Ok(series) => earliest_close(&series).map(|close| (key, close)),
                            Err(e) => {
                                debug!("No {} history for {}: {}", window, key, e);
                                None
                            }
                        }
                    }
                })
                .buffer_unordered(self.settings.concurrency())
                .filter_map(|baseline| async move { baseline })
                .collect()
                .await;
        }

        debug!("Window {}: {} baselines fetched", window, baselines.len());
        self.complete_window_switch(window, baselines);
        self.range.recompute(&mut self.positions, as_of);
        self.scheduler.request(RenderRequest::Immediate, Instant::now());
        true
    }

    /// Asks the scheduler for a render.
    pub fn request_render(&mut self, request: RenderRequest, now: Instant) -> RenderDecision {
        self.scheduler.request(request, now)
    }

    /// Renders when a scheduled render is due.
    pub fn poll_render(&mut self, now: Instant, as_of: DateTime<Utc>) -> Option<Dashboard> {
        self.scheduler.poll(now).then(|| self.render(as_of))
    }

    /// Recomputes range metrics once if anything changed, then builds the
    /// dashboard.
    pub fn render(&mut self, as_of: DateTime<Utc>) -> Dashboard {
        self.range.recompute_if_dirty(&mut self.positions, as_of);
        self.dashboard(as_of)
    }

    /// Dashboard from the current state, without recomputing.
    pub fn dashboard(&self, as_of: DateTime<Utc>) -> Dashboard {
        let equity: Decimal = self.positions.iter().map(|p| p.valuation.market_value).sum();
        let cash_available: Decimal = self
            .positions
            .iter()
            .filter(|p| p.category == AssetCategory::Cash)
            .map(|p| p.valuation.market_value)
            .sum();

        let mut by_group = BTreeMap::new();
        for position in &self.positions {
            *by_group
                .entry(position.category.group())
                .or_insert(Decimal::ZERO) += position.valuation.market_value;
        }
        let allocation = by_group
            .into_iter()
            .map(|(group, market_value)| AllocationSlice {
                group,
                market_value,
                weight: if equity.is_zero() {
                    Decimal::ZERO
                } else {
                    market_value / equity * dec!(100)
                },
            })
            .collect();

        let totals = self.range.totals().cloned();
        let (total_range_pnl, total_range_change_percent) = totals
            .as_ref()
            .map(|t| (t.overall.pnl, t.overall.change_percent))
            .unwrap_or_default();

        Dashboard {
            generated_at: as_of,
            window: self.range.window(),
            equity,
            cash_available,
            total_range_pnl,
            total_range_change_percent,
            allocation,
            range_totals: totals,
            positions: self.positions.iter().map(position_row).collect(),
            ledger: self.ledger_meta.clone(),
        }
    }

    pub fn export_csv(&self) -> Result<String> {
        let rows: Vec<PositionRow> = self.positions.iter().map(position_row).collect();
        export_positions_csv(&rows)
    }

    pub fn net_worth_timeline(&self, as_of: DateTime<Utc>) -> NetWorthTimeline {
        let total_market_value: Decimal =
            self.positions.iter().map(|p| p.valuation.market_value).sum();
        let settings = ProjectionSettings {
            growth_rate: self.settings.growth_rate,
            short_years: self.settings.short_projection_years,
            horizon_years: self.settings.projection_horizon_years,
            milestone: self.settings.wealth_milestone,
        };
        build_net_worth_timeline(&self.operations, total_market_value, as_of, &settings)
    }

    pub fn real_estate_stats(&self, as_of: DateTime<Utc>) -> Vec<RealEstateStat> {
        let rates = ProjectionRates {
            appreciation: self.settings.appreciation_rate,
            depreciation: self.settings.depreciation_rate,
        };
        compute_real_estate_stats(&self.positions, as_of, &rates)
    }

    /// Positions whose last quote was rejected.
    pub fn unavailable_quotes(&self) -> Vec<&str> {
        self.positions
            .iter()
            .filter(|p| p.quote.status == QuoteStatus::Unavailable)
            .map(|p| p.asset_key.as_str())
            .collect()
    }
}

fn position_row(position: &Position) -> PositionRow {
    let (pnl, change_percent, direction) = match &position.range {
        Some(metrics) => (metrics.pnl, metrics.change_percent, metrics.direction),
        None => (position.valuation.pnl, Decimal::ZERO, None),
    };
    PositionRow {
        asset_key: position.asset_key.clone(),
        display_name: position.display_name.clone(),
        symbol: position.symbol.clone(),
        category: position.category.label().to_string(),
        quantity: position.quantity,
        average_price: position.average_cost(),
        current_price: position.valuation.price,
        market_value: position.valuation.market_value,
        pnl,
        change_percent,
        daily_change_percent: position.valuation.change_percent,
        quote_status: position.quote.status,
        direction,
    }
}
