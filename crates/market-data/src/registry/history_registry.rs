//! Tiered history lookup.
//!
//! Every tier that supports the instrument class is asked for the range and
//! the successful series are merged. Tiers are merged in registration order,
//! so a later tier overrides an earlier one on the same timestamp.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::models::{merge_series, PricePoint, QuoteContext};
use crate::provider::HistoryProvider;

use super::circuit_breaker::CircuitBreaker;

pub struct HistoryRegistry {
    tiers: Vec<Arc<dyn HistoryProvider>>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl HistoryRegistry {
    pub fn new(tiers: Vec<Arc<dyn HistoryProvider>>, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            tiers,
            circuit_breaker,
        }
    }

    /// Merged, de-duplicated, time-sorted closes in `[start, end]`.
    ///
    /// Fails only when no tier produced any point.
    pub async fn fetch_history(
        &self,
        context: &QuoteContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, MarketDataError> {
        let tiers: Vec<_> = self
            .tiers
            .iter()
            .filter(|t| t.supports(context.class))
            .collect();

        if tiers.is_empty() {
            return Err(MarketDataError::NoProvidersAvailable);
        }

        let mut series = Vec::with_capacity(tiers.len());
        let mut last_error: Option<MarketDataError> = None;

        for tier in tiers {
            let tier_id = tier.id();
            if !self.circuit_breaker.is_allowed(tier_id) {
                debug!("Circuit breaker open for '{}', skipping history", tier_id);
                continue;
            }

            match tier.get_history(context, start, end).await {
                Ok(points) => {
                    self.circuit_breaker.record_success(tier_id);
                    debug!(
                        "History for '{}' from '{}': {} points",
                        context.symbol,
                        tier_id,
                        points.len()
                    );
                    series.push(points);
                }
                Err(e) => {
                    if e.retry_class() == RetryClass::FailoverWithPenalty {
                        self.circuit_breaker.record_failure(tier_id);
                    }
                    warn!("History tier '{}' failed for '{}': {}", tier_id, context.symbol, e);
                    last_error = Some(e);
                }
            }
        }

        let merged = merge_series(series);
        if merged.is_empty() {
            return Err(last_error.unwrap_or(MarketDataError::NoDataForRange));
        }
        Ok(merged)
    }
}
