use crate::foundation::error::{AugmentError, AugmentResult};
use crate::foundation::timing::Sleeper;
use crate::service::api::{ServiceError, is_rate_limit};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Exponential-backoff policy for rate-limited calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubled for every following one.
    pub initial_backoff: Duration,
    /// Upper bound of the uniform random jitter added to every backoff.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the failed 0-based `attempt`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Notification emitted before every backoff wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryNotice {
    /// 1-based number of the attempt that just failed.
    pub attempt: u32,
    /// Configured attempt budget.
    pub max_attempts: u32,
    /// Wait before the next attempt.
    pub delay: Duration,
}

/// Wraps single external-service invocations with rate-limit retry.
///
/// Only rate-limit failures are retried. Any other failure is returned immediately as
/// [`AugmentError::Service`]; running out of attempts yields
/// [`AugmentError::RateLimitExhausted`].
#[derive(Clone)]
pub struct RetryingCaller {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingCaller {
    /// Create a caller that waits through `sleeper`.
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Invoke `op` until it succeeds, fails with a non-rate-limit error, or the budget runs out.
    ///
    /// `on_retry` is called before each backoff wait with strictly increasing attempt numbers.
    pub fn call<T>(
        &self,
        mut op: impl FnMut() -> Result<T, ServiceError>,
        on_retry: &mut dyn FnMut(RetryNotice),
    ) -> AugmentResult<T> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last: Option<ServiceError> = None;
        for attempt in 0..max_attempts {
            let err = match op() {
                Ok(v) => return Ok(v),
                Err(e) if is_rate_limit(&e) => e,
                Err(e) => return Err(AugmentError::Service(e)),
            };
            if attempt + 1 < max_attempts {
                let delay = self.policy.backoff(attempt) + self.policy.jitter();
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "rate limit hit; backing off"
                );
                on_retry(RetryNotice {
                    attempt: attempt + 1,
                    max_attempts,
                    delay,
                });
                self.sleeper.sleep(delay);
            }
            last = Some(err);
        }
        Err(AugmentError::RateLimitExhausted {
            attempts: max_attempts,
            last: last.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/retry.rs"]
mod tests;
