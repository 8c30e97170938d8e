//! Per-provider circuit breaker.
//!
//! - **Closed**: requests flow.
//! - **Open**: provider skipped until the cooldown elapses.
//! - **HalfOpen**: one probe is let through; success closes, failure reopens.
//!
//! State is in-memory only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Consecutive penalised failures before the circuit opens.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open circuit lets a probe through.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failures: u32,
    opened_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            opened_at: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Thread-safe breaker shared by the quote and history registries.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits, recovering from poison: a stale count is harmless.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether a request to `provider` may go out now.
    pub fn is_allowed(&self, provider: &str) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_default();

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = circuit
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown);
                if cooled {
                    info!("Circuit breaker: '{}' Open -> HalfOpen", provider);
                    circuit.state = CircuitState::HalfOpen;
                }
                cooled
            }
        }
    }

    pub fn record_success(&self, provider: &str) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_default();

        if circuit.state != CircuitState::Closed {
            info!("Circuit breaker: closing circuit for '{}'", provider);
        }
        *circuit = Circuit::default();
    }

    pub fn record_failure(&self, provider: &str) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_default();
        circuit.failures += 1;

        match circuit.state {
            CircuitState::Closed if circuit.failures >= self.config.failure_threshold => {
                info!(
                    "Circuit breaker: opening circuit for '{}' after {} failures",
                    provider, circuit.failures
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => debug!(
                "Circuit breaker: failure for '{}' ({}/{})",
                provider, circuit.failures, self.config.failure_threshold
            ),
            CircuitState::HalfOpen | CircuitState::Open => {
                info!("Circuit breaker: probe failed, reopening '{}'", provider);
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
        }
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.lock_circuits()
            .get(provider)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown: Duration) -> CircuitBreaker {
        CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown,
        })
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::new();
        assert!(cb.is_allowed("FINNHUB"));
        assert_eq!(cb.state("FINNHUB"), CircuitState::Closed);
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(3, Duration::from_secs(60));

        cb.record_failure("FINNHUB");
        cb.record_failure("FINNHUB");
        assert!(cb.is_allowed("FINNHUB"));

        cb.record_failure("FINNHUB");
        assert!(!cb.is_allowed("FINNHUB"));
        assert_eq!(cb.state("FINNHUB"), CircuitState::Open);
        assert!(cb.is_allowed("COINGECKO"));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(2, Duration::from_secs(60));
        cb.record_failure("YAHOO");
        cb.record_success("YAHOO");
        cb.record_failure("YAHOO");
        assert_eq!(cb.state("YAHOO"), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_probe() {
        let cb = breaker(1, Duration::from_millis(10));
        cb.record_failure("FINNHUB");
        assert!(!cb.is_allowed("FINNHUB"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed("FINNHUB"));
        assert_eq!(cb.state("FINNHUB"), CircuitState::HalfOpen);

        cb.record_failure("FINNHUB");
        assert_eq!(cb.state("FINNHUB"), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed("FINNHUB"));
        cb.record_success("FINNHUB");
        assert_eq!(cb.state("FINNHUB"), CircuitState::Closed);
    }
}
