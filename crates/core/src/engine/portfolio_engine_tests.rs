//! Tests for the portfolio engine, using in-memory market data providers.

#[cfg(test)]
mod tests {
    use crate::engine::PortfolioEngine;
    use crate::ledger::{DemoSource, LedgerTier, TieredLedgerLoader};
    use crate::operations::LedgerRecord;
    use crate::portfolio::{PnlRange, PriceSource, QuoteStatus};
    use crate::settings::EngineSettings;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ledgerfolio_market_data::{
        CircuitBreaker, HistoryProvider, HistoryRegistry, InstrumentClass, MarketDataError,
        PricePoint, QuoteContext, QuoteProvider, QuoteRegistry, QuoteSnapshot,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Instant;

    struct MockQuotes;

    #[async_trait]
    impl QuoteProvider for MockQuotes {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        fn supports(&self, _class: InstrumentClass) -> bool {
            true
        }

        async fn get_latest_quote(
            &self,
            context: &QuoteContext,
        ) -> Result<QuoteSnapshot, MarketDataError> {
            let (price, previous_close) = match context.symbol.as_str() {
                "AAPL" => (dec!(170), dec!(165)),
                "BINANCE:BTCUSDT" => (dec!(40000), dec!(39000)),
                other => return Err(MarketDataError::SymbolNotFound(other.to_string())),
            };
            Ok(QuoteSnapshot::new(
                context.symbol.clone(),
                price,
                Some(previous_close),
                Utc::now(),
                "MOCK",
            ))
        }
    }

    struct MockHistory;

    #[async_trait]
    impl HistoryProvider for MockHistory {
        fn id(&self) -> &'static str {
            "MOCK_HISTORY"
        }

        fn supports(&self, _class: InstrumentClass) -> bool {
            true
        }

        async fn get_history(
            &self,
            context: &QuoteContext,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PricePoint>, MarketDataError> {
            let first = match context.symbol.as_str() {
                "AAPL" => dec!(160),
                "BINANCE:BTCUSDT" => dec!(35000),
                other => return Err(MarketDataError::SymbolNotFound(other.to_string())),
            };
            Ok(vec![
                PricePoint::new(start + Duration::days(1), first),
                PricePoint::new(end, first + dec!(1)),
            ])
        }
    }

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> PortfolioEngine {
        let breaker = Arc::new(CircuitBreaker::new());
        let quotes = QuoteRegistry::new(vec![Arc::new(MockQuotes)], breaker.clone())
            .with_batch_pause(std::time::Duration::ZERO);
        let history = HistoryRegistry::new(vec![Arc::new(MockHistory)], breaker);
        let mut engine = PortfolioEngine::new(EngineSettings::default())
            .with_quote_registry(Arc::new(quotes))
            .with_history_registry(Arc::new(history));
        engine.load_records(&DemoSource::records(), None);
        engine
    }

    fn record(id: &str, fields: Value) -> LedgerRecord {
        serde_json::from_value(json!({ "id": id, "fields": fields })).unwrap()
    }

    fn bare_engine() -> PortfolioEngine {
        let breaker = Arc::new(CircuitBreaker::new());
        let quotes = QuoteRegistry::new(vec![Arc::new(MockQuotes)], breaker)
            .with_batch_pause(std::time::Duration::ZERO);
        PortfolioEngine::new(EngineSettings::default()).with_quote_registry(Arc::new(quotes))
    }

    #[tokio::test]
    async fn test_reload_reports_tier() {
        let loader = TieredLedgerLoader::new(vec![Arc::new(DemoSource)]);
        let mut engine = PortfolioEngine::new(EngineSettings::default());
        let meta = engine.reload(&loader).await.unwrap();
        assert_eq!(meta.tier, LedgerTier::Demo);
        assert_eq!(meta.count, 3);
        assert_eq!(engine.positions().len(), 3);
        assert_eq!(engine.dashboard(as_of()).ledger.unwrap().tier, LedgerTier::Demo);
    }

    #[test]
    fn test_dashboard_before_quotes() {
        let mut engine = engine();
        let dashboard = engine.render(as_of());
        assert_eq!(dashboard.equity, dec!(11500));
        assert_eq!(dashboard.cash_available, dec!(2500));
        assert_eq!(dashboard.total_range_pnl, Decimal::ZERO);
        assert_eq!(dashboard.positions.len(), 3);
        assert_eq!(dashboard.positions[2].display_name, "Cash Reserve");

        let weights: Decimal = dashboard.allocation.iter().map(|a| a.weight).sum();
        assert_eq!(weights.round_dp(6), dec!(100));
    }

    #[tokio::test]
    async fn test_preload_quotes_and_all_window() {
        let mut engine = engine();
        assert_eq!(engine.preload_quotes().await, 2);

        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.valuation.price_source, PriceSource::Live);
        assert_eq!(aapl.valuation.market_value, dec!(1700));
        assert_eq!(aapl.quote.previous_close, Some(dec!(165)));

        let dashboard = engine.render(as_of());
        assert_eq!(dashboard.equity, dec!(1700) + dec!(10000) + dec!(2500));
        assert_eq!(dashboard.total_range_pnl, dec!(2700));
    }

    #[tokio::test]
    async fn test_set_window_fetches_baselines_once() {
        let mut engine = engine();
        engine.preload_quotes().await;

        assert!(engine.set_window(PnlRange::OneMonth, as_of()).await);
        assert_eq!(engine.window(), PnlRange::OneMonth);
        assert!(!engine.range_engine().is_switch_in_flight());
        assert_eq!(engine.range_engine().baselines().len(), 2);

        let dashboard = engine.render(as_of());
        // AAPL (170 - 160) x 10, BTC (40000 - 35000) x 0.25, cash flat
        assert_eq!(dashboard.total_range_pnl, dec!(1350));

        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.range.as_ref().unwrap().baseline_price, dec!(160));

        // One day window uses the previous close instead of history
        assert!(engine.set_window(PnlRange::OneDay, as_of()).await);
        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.range.as_ref().unwrap().baseline_price, dec!(165));
    }

    #[test]
    fn test_window_switch_guard() {
        let mut engine = engine();
        assert!(engine.begin_window_switch(PnlRange::OneWeek));
        assert!(!engine.begin_window_switch(PnlRange::OneYear));
        engine.complete_window_switch(PnlRange::OneWeek, vec![("AAPL".to_string(), dec!(140))]);
        assert_eq!(engine.window(), PnlRange::OneWeek);

        engine.render(as_of());
        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.range.as_ref().unwrap().pnl, dec!(100));
        assert!(engine.begin_window_switch(PnlRange::OneYear));
    }

    #[test]
    fn test_rejected_quote_marks_unavailable() {
        let mut engine = engine();
        let now = Instant::now();
        assert!(engine.apply_quote("AAPL", Some(dec!(180)), None, "STREAM", now));
        assert!(!engine.apply_quote("AAPL", Some(dec!(0)), None, "STREAM", now));
        assert!(!engine.apply_quote("UNKNOWN", Some(dec!(1)), None, "STREAM", now));

        assert_eq!(engine.unavailable_quotes(), vec!["AAPL"]);
        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.quote.status, QuoteStatus::Unavailable);
        assert_eq!(aapl.valuation.market_value, dec!(1800));
    }

    #[test]
    fn test_crypto_ticks_are_coalesced_into_one_render() {
        let mut engine = engine();
        let t0 = Instant::now();
        engine.apply_quote("BINANCE:BTCUSDT", Some(dec!(41000)), None, "STREAM", t0);
        engine.apply_quote(
            "BINANCE:BTCUSDT",
            Some(dec!(42000)),
            None,
            "STREAM",
            t0 + std::time::Duration::from_millis(300),
        );
        assert!(engine
            .poll_render(t0 + std::time::Duration::from_millis(999), as_of())
            .is_none());

        let dashboard = engine
            .poll_render(t0 + std::time::Duration::from_millis(1000), as_of())
            .unwrap();
        let btc = dashboard
            .positions
            .iter()
            .find(|row| row.asset_key == "BTC")
            .unwrap();
        assert_eq!(btc.market_value, dec!(10500));
        assert!(engine
            .poll_render(t0 + std::time::Duration::from_millis(2000), as_of())
            .is_none());
    }

    #[test]
    fn test_export_csv() {
        let engine = engine();
        let csv = engine.export_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            r#""Display","Symbol","Category","Qty","AvgPrice","CurrentPrice","MarketValue","P&L","Change%""#
        );
        let aapl = lines.next().unwrap();
        assert!(aapl.starts_with(r#""AAPL","AAPL","Stock","10","150"#));
        assert!(csv.contains(r#""Cash Reserve","","Cash""#));
    }

    #[test]
    fn test_timeline_anchor_matches_market_value() {
        let engine = engine();
        let timeline = engine.net_worth_timeline(as_of());
        let equity: Decimal = engine
            .positions()
            .iter()
            .map(|p| p.valuation.market_value)
            .sum();
        let anchor = timeline.actual_points.last().unwrap();
        assert_eq!(anchor.value, equity);
        assert!(timeline.projected_points[0].value >= anchor.value);
        assert!(engine.real_estate_stats(as_of()).is_empty());
    }

    #[tokio::test]
    async fn test_assets_sharing_a_symbol_all_receive_quotes() {
        let mut engine = bare_engine();
        engine.load_records(
            &[
                record("r1", json!({"Asset": "BTC", "Category": "Crypto", "Operation type": "PurchaseSell", "Amount": 0.25, "Price": 30000})),
                record("r2", json!({"Asset": "BTCUSDT", "Category": "Crypto", "Operation type": "PurchaseSell", "Amount": 0.5, "Price": 30000})),
            ],
            None,
        );

        assert!(engine.apply_quote("BINANCE:BTCUSDT", Some(dec!(40000)), None, "STREAM", Instant::now()));
        let btc = engine.position("BTC").unwrap();
        let pair = engine.position("BTCUSDT").unwrap();
        assert_eq!(btc.quote.live_price, Some(dec!(40000)));
        assert_eq!(btc.valuation.market_value, dec!(10000));
        assert_eq!(pair.quote.live_price, Some(dec!(40000)));
        assert_eq!(pair.valuation.market_value, dec!(20000));

        // One fetch serves both positions
        assert_eq!(engine.preload_quotes().await, 1);
        assert_eq!(engine.position("BTC").unwrap().quote.status, QuoteStatus::Live);
        assert_eq!(engine.position("BTCUSDT").unwrap().quote.status, QuoteStatus::Live);
    }

    #[test]
    fn test_display_price_pins_over_live_ticks() {
        let mut engine = engine();
        assert!(engine.set_display_price("AAPL", Some(dec!(200))));
        engine.apply_quote("AAPL", Some(dec!(170)), None, "STREAM", Instant::now());

        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.valuation.price, dec!(200));
        assert_eq!(aapl.valuation.price_source, PriceSource::Display);
        assert_eq!(aapl.valuation.market_value, dec!(2000));

        assert!(engine.set_display_price("AAPL", None));
        let aapl = engine.position("AAPL").unwrap();
        assert_eq!(aapl.valuation.price, dec!(170));
        assert_eq!(aapl.valuation.price_source, PriceSource::Live);
        assert!(!engine.set_display_price("NOPE", Some(dec!(1))));
    }

    #[test]
    fn test_out_of_range_rows_are_absorbed() {
        let mut engine = bare_engine();
        engine.load_records(
            &[
                record("huge", json!({"Asset": "DOGE", "Category": "Crypto", "Operation type": "PurchaseSell", "Amount": 1e16, "Price": 1e13})),
                record("flat", json!({"Asset": "Flat", "Category": "Real Estate", "Operation type": "PurchaseSell", "Amount": 1, "Spent on operation": 200000, "Date": "0202-05-01"})),
            ],
            None,
        );

        assert_eq!(engine.operations().len(), 1);
        assert!(engine.position("DOGE").is_none());

        let stats = engine.real_estate_stats(as_of());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].final_asset_price, dec!(200000));
        assert_eq!(stats[0].projected_value, dec!(200000));
    }

    #[test]
    fn test_reload_drops_stale_scheduled_render() {
        let mut engine = engine();
        let t0 = Instant::now();
        engine.apply_quote("AAPL", Some(dec!(171)), None, "STREAM", t0);
        engine.apply_quote(
            "AAPL",
            Some(dec!(172)),
            None,
            "STREAM",
            t0 + std::time::Duration::from_millis(10),
        );

        engine.load_records(&DemoSource::records(), None);
        assert!(engine
            .poll_render(t0 + std::time::Duration::from_millis(6000), as_of())
            .is_none());
    }
}
