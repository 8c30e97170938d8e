/// Classification for retry policy.
///
/// Used by the registries to decide whether a failed provider call should fall
/// through to the next tier.
///
/// | Class | Try Next Provider? | Record Circuit Breaker Failure? |
/// |-------|-------------------|--------------------------------|
/// | `Never` | No | No |
/// | `FailoverWithPenalty` | Yes | Yes |
/// | `NextProvider` | Yes | No |
/// | `CircuitOpen` | Yes (skip this one) | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request itself is invalid; no other tier will do better.
    Never,

    /// Transient failure (rate limit, timeout). Fall through and penalise the
    /// provider so repeated failures open its circuit.
    FailoverWithPenalty,

    /// This provider cannot serve the request but another tier might.
    NextProvider,

    /// Circuit breaker is open for this provider.
    CircuitOpen,
}

impl RetryClass {
    /// Whether the registry should move on to the next tier.
    pub fn falls_through(&self) -> bool {
        !matches!(self, RetryClass::Never)
    }
}
