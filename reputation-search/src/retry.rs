//! Retry policy for provider calls.
//!
//! The policy only decides *whether* and *how long* to wait; the gateway
//! owns the sleeping, so delays can be asserted without a clock.

use std::time::Duration;

use crate::error::SearchError;

/// Bounded retry with backoff that depends on the failure kind.
///
/// - Rate limiting (HTTP 429) backs off exponentially:
///   `base_delay * 2^(attempt - 1)`.
/// - Any other transient failure backs off linearly:
///   `base_delay * attempt`.
/// - Permanent failures (missing credentials, bad query, bad config) are
///   never retried.
///
/// Every delay is capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit for both backoff shapes.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// How long to wait after `attempt` (1-based) failed with `error`.
    ///
    /// Returns `None` when the budget is spent or the error is permanent.
    pub fn delay_after(&self, attempt: u32, error: &SearchError) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_transient() {
            return None;
        }

        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = if error.is_rate_limited() {
            let shift = attempt.saturating_sub(1).min(63);
            let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
            base_ms.saturating_mul(multiplier)
        } else {
            base_ms.saturating_mul(u64::from(attempt))
        };

        Some(Duration::from_millis(delay_ms).min(self.max_delay))
    }
}
