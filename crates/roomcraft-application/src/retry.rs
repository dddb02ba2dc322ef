//! Caller-side retry of transformation actions.
//!
//! The workflow performs exactly one provider call per action. Callers that
//! want to ride out rate limits or transient outages wrap the action with
//! [`retry_transform`].

use roomcraft_core::Result;
use roomcraft_core::config::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to re-run a failed transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; never below 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that runs the action exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay after the `attempt`-th failure (1-based), doubling each time.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Runs `operation` until it succeeds, fails with something other than a
/// retryable transformation failure, or runs out of attempts.
///
/// A provider-supplied `Retry-After` wins over the computed backoff; both are
/// capped at the policy's maximum.
pub async fn retry_transform<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let delay = match err.transform_failure() {
            Some(failure) if failure.is_retryable && attempt < policy.max_attempts => failure
                .retry_after
                .unwrap_or_else(|| policy.backoff_for(attempt))
                .min(policy.max_backoff),
            _ => return Err(err),
        };

        tracing::warn!(
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Transformation failed, retrying: {}",
            err
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
