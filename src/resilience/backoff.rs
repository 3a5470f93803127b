//! Exponential backoff with jitter.

use rand::Rng;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::RetryConfig;

/// Immutable retry policy built from a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter: bool,
    retryable_statuses: BTreeSet<u16>,
    retry_network_errors: bool,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter: config.jitter,
            retryable_statuses: config.retryable_statuses.clone(),
            retry_network_errors: config.retry_network_errors,
        }
    }

    /// Policy for a client with retries switched off: one attempt, nothing retryable.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            jitter: false,
            retryable_statuses: BTreeSet::new(),
            retry_network_errors: false,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub fn retries_network_errors(&self) -> bool {
        self.retry_network_errors
    }

    /// Delay before the retry that follows `attempt` (0-based).
    ///
    /// The cap is applied before jitter, so with jitter on the result can
    /// reach up to 1.5x `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let capped = self.capped_nanos(attempt);
        let nanos = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..1.5)
        } else {
            capped
        };
        // float -> int casts saturate
        Duration::from_nanos(nanos as u64)
    }

    fn capped_nanos(&self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        raw.min(self.max_backoff.as_nanos() as f64)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config)
    }
}
