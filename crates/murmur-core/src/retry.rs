//! Bounded retry loop for transient upstream failures

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::UpstreamError;

/// How often and how patiently transient failures are retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap for any delay, including provider `Retry-After` hints
    pub max_delay: Duration,
    /// Randomize the upper half of each backoff delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            jitter: true,
        }
    }

    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Total number of attempts, first try included
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Exponential delay before retry number `retry` (1-based), capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn delay_for(&self, retry: u32, error: &UpstreamError) -> Duration {
        if let UpstreamError::Unavailable {
            retry_after: Some(hint), ..
        } = error
        {
            return (*hint).min(self.max_delay);
        }

        let delay = self.backoff(retry);
        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let half = delay / 2;
        let spread = u64::try_from(half.as_millis()).unwrap_or(u64::MAX);
        half + Duration::from_millis(rand::rng().random_range(0..=spread))
    }
}

/// Run `call` until it succeeds, fails permanently, or the policy is spent
///
/// `call` receives the 1-based attempt number. Only transient errors are
/// retried; the last error is returned unchanged so a final timeout still
/// surfaces as `Timeout`.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &'static str, mut call: F) -> Result<T, UpstreamError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match call(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation, attempt, "upstream call recovered after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt, &error);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "transient upstream failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                if error.is_transient() {
                    tracing::error!(operation, attempts = attempt, error = %error, "upstream retries exhausted");
                } else {
                    tracing::debug!(operation, attempt, error = %error, "non-retryable upstream failure");
                }
                return Err(error);
            }
        }
    }
}
