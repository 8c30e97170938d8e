//! Provider orchestration.
//!
//! - Quote tiers: stream cache, then snapshot providers by priority
//! - History tiers: every supporting provider, merged
//! - Circuit breaking shared across both
//! - Price validation

mod circuit_breaker;
mod history_registry;
mod quote_registry;
mod validator;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use history_registry::HistoryRegistry;
pub use quote_registry::{QuoteRegistry, SNAPSHOT_BATCH_SIZE, STREAM_SOURCE};
pub use validator::{price_from_f64, validate_quote};
