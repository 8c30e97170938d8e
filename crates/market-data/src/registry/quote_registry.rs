//! Tiered quote lookup: stream cache first, then snapshot providers in
//! priority order, with circuit breaking and validation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::{QuoteContext, QuoteSnapshot};
use crate::provider::QuoteProvider;

use super::circuit_breaker::CircuitBreaker;
use super::validator::validate_quote;

/// Source label for quotes taken from the stream cache.
pub const STREAM_SOURCE: &str = "STREAM";

/// Maximum symbols per snapshot round.
pub const SNAPSHOT_BATCH_SIZE: usize = 5;

/// Pause between snapshot rounds.
const BATCH_PAUSE: Duration = Duration::from_millis(120);

pub struct QuoteRegistry {
    providers: Vec<Arc<dyn QuoteProvider>>,
    circuit_breaker: Arc<CircuitBreaker>,
    /// Latest stream tick per primary symbol.
    stream: RwLock<HashMap<String, QuoteSnapshot>>,
    batch_pause: Duration,
}

impl QuoteRegistry {
    /// Providers are sorted by priority; ties keep registration order.
    pub fn new(
        mut providers: Vec<Arc<dyn QuoteProvider>>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            circuit_breaker,
            stream: RwLock::new(HashMap::new()),
            batch_pause: BATCH_PAUSE,
        }
    }

    /// Overrides the pause between snapshot rounds.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Stores a stream tick. Unusable prices are dropped and `false` returned.
    pub fn record_tick(&self, quote: QuoteSnapshot) -> bool {
        if let Err(e) = validate_quote(&quote) {
            debug!("Dropping stream tick: {}", e);
            return false;
        }
        let mut stream = self.stream.write().unwrap_or_else(|poisoned| {
            warn!("Stream cache lock was poisoned, recovering");
            poisoned.into_inner()
        });
        stream.insert(quote.symbol.clone(), quote);
        true
    }

    fn stream_quote(&self, symbol: &str) -> Option<QuoteSnapshot> {
        let stream = self
            .stream
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stream.get(symbol).cloned()
    }

    /// Latest quote for one instrument.
    ///
    /// 1. Stream cache
    /// 2. Providers supporting the instrument class, by priority
    /// 3. On failure, fall through according to the error's retry class
    pub async fn fetch_latest_quote(
        &self,
        context: &QuoteContext,
    ) -> Result<QuoteSnapshot, MarketDataError> {
        if let Some(mut tick) = self.stream_quote(&context.symbol) {
            tick.source = STREAM_SOURCE.to_string();
            return Ok(tick);
        }

        let providers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.supports(context.class))
            .collect();

        if providers.is_empty() {
            warn!("No quote providers for {:?}", context.class);
            return Err(MarketDataError::NoProvidersAvailable);
        }

        let mut last_error: Option<MarketDataError> = None;

        for provider in providers {
            let provider_id = provider.id();

            if !self.circuit_breaker.is_allowed(provider_id) {
                debug!("Circuit breaker open for '{}', skipping", provider_id);
                last_error = Some(MarketDataError::CircuitOpen {
                    provider: provider_id.to_string(),
                });
                continue;
            }

            let result = provider
                .get_latest_quote(context)
                .await
                .and_then(|quote| validate_quote(&quote).map(|_| quote));

            match result {
                Ok(quote) => {
                    self.circuit_breaker.record_success(provider_id);
                    debug!(
                        "Quote for '{}' from '{}': {}",
                        context.symbol, provider_id, quote.price
                    );
                    return Ok(quote);
                }
                Err(e) => {
                    match e.retry_class() {
                        RetryClass::Never => return Err(e),
                        RetryClass::FailoverWithPenalty => {
                            self.circuit_breaker.record_failure(provider_id);
                            warn!("Provider '{}' failed with {}, penalised", provider_id, e);
                        }
                        RetryClass::NextProvider | RetryClass::CircuitOpen => {
                            info!("Provider '{}' failed with {}, trying next", provider_id, e);
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(MarketDataError::AllProvidersFailed))
    }

    /// Snapshot quotes for many instruments.
    ///
    /// Instruments are fetched in rounds of at most [`SNAPSHOT_BATCH_SIZE`];
    /// within a round at most `concurrency` requests are in flight. Results
    /// come back in input order.
    pub async fn fetch_snapshots(
        &self,
        contexts: &[QuoteContext],
        concurrency: usize,
    ) -> Vec<(QuoteContext, Result<QuoteSnapshot, MarketDataError>)> {
        let width = concurrency.clamp(1, SNAPSHOT_BATCH_SIZE);
        let mut results = Vec::with_capacity(contexts.len());

        for (round, batch) in contexts.chunks(SNAPSHOT_BATCH_SIZE).enumerate() {
            if round > 0 && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }

            let mut fetched: Vec<(usize, QuoteContext, Result<QuoteSnapshot, MarketDataError>)> =
                stream::iter(batch.iter().enumerate())
                    .map(|(index, context)| async move {
                        (index, context.clone(), self.fetch_latest_quote(context).await)
                    })
                    .buffer_unordered(width)
                    .collect()
                    .await;

            fetched.sort_by_key(|(index, _, _)| *index);
            results.extend(fetched.into_iter().map(|(_, ctx, res)| (ctx, res)));
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstrumentClass;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        id: &'static str,
        priority: u8,
        class: Option<InstrumentClass>,
        outcome: fn(&str) -> Result<Decimal, MarketDataError>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(
            id: &'static str,
            priority: u8,
            outcome: fn(&str) -> Result<Decimal, MarketDataError>,
        ) -> Self {
            Self {
                id,
                priority,
                class: None,
                outcome,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn supports(&self, class: InstrumentClass) -> bool {
            self.class.map_or(true, |c| c == class)
        }

        async fn get_latest_quote(
            &self,
            context: &QuoteContext,
        ) -> Result<QuoteSnapshot, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let price = (self.outcome)(&context.symbol)?;
            Ok(QuoteSnapshot::new(
                context.symbol.clone(),
                price,
                None,
                Utc::now(),
                self.id,
            ))
        }
    }

    fn ctx(symbol: &str) -> QuoteContext {
        QuoteContext::new(symbol, symbol, InstrumentClass::Equity)
    }

    fn registry(providers: Vec<Arc<dyn QuoteProvider>>) -> QuoteRegistry {
        QuoteRegistry::new(providers, Arc::new(CircuitBreaker::new()))
            .with_batch_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_stream_tick_wins() {
        let snapshot = Arc::new(MockProvider::new("SNAP", 1, |_| Ok(dec!(10))));
        let registry = registry(vec![snapshot.clone()]);

        assert!(registry.record_tick(QuoteSnapshot::new("AAPL", dec!(12), None, Utc::now(), "WS")));
        let quote = registry.fetch_latest_quote(&ctx("AAPL")).await.unwrap();

        assert_eq!(quote.price, dec!(12));
        assert_eq!(quote.source, STREAM_SOURCE);
        assert_eq!(snapshot.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_tick_is_dropped() {
        let registry = registry(vec![Arc::new(MockProvider::new("SNAP", 1, |_| Ok(dec!(10))))]);
        assert!(!registry.record_tick(QuoteSnapshot::new("AAPL", dec!(0), None, Utc::now(), "WS")));
        let quote = registry.fetch_latest_quote(&ctx("AAPL")).await.unwrap();
        assert_eq!(quote.source, "SNAP");
    }

    #[tokio::test]
    async fn test_zero_price_falls_back_to_alternate() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1, |_| Ok(dec!(0))));
        let alternate = Arc::new(MockProvider::new("ALT", 5, |_| Ok(dec!(99))));
        let registry = registry(vec![alternate.clone(), primary.clone()]);

        let quote = registry.fetch_latest_quote(&ctx("AAPL")).await.unwrap();

        assert_eq!(quote.source, "ALT");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_fail_returns_last_error() {
        let primary = Arc::new(MockProvider::new("PRIMARY", 1, |_| {
            Err(MarketDataError::RateLimited {
                provider: "PRIMARY".to_string(),
            })
        }));
        let alternate = Arc::new(MockProvider::new("ALT", 2, |s| {
            Err(MarketDataError::SymbolNotFound(s.to_string()))
        }));
        let registry = registry(vec![primary, alternate]);

        let err = registry.fetch_latest_quote(&ctx("NOPE")).await.unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[tokio::test]
    async fn test_unsupported_class_has_no_providers() {
        let mut crypto_only = MockProvider::new("CG", 1, |_| Ok(dec!(1)));
        crypto_only.class = Some(InstrumentClass::Crypto);
        let registry = registry(vec![Arc::new(crypto_only)]);

        let err = registry.fetch_latest_quote(&ctx("AAPL")).await.unwrap_err();
        assert!(matches!(err, MarketDataError::NoProvidersAvailable));
    }

    #[tokio::test]
    async fn test_snapshots_keep_input_order_across_rounds() {
        let provider = Arc::new(MockProvider::new("SNAP", 1, |s| {
            if s == "BAD" {
                Err(MarketDataError::SymbolNotFound(s.to_string()))
            } else {
                Ok(dec!(5))
            }
        }));
        let registry = registry(vec![provider.clone()]);
        let symbols = ["A", "B", "C", "D", "E", "F", "BAD"];
        let contexts: Vec<_> = symbols.iter().map(|s| ctx(s)).collect();

        let results = registry.fetch_snapshots(&contexts, 3).await;

        let order: Vec<_> = results.iter().map(|(c, _)| c.symbol.as_str()).collect();
        assert_eq!(order, symbols.to_vec());
        assert!(results[6].1.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 7);
    }
}
