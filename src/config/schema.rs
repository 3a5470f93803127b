//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.
//! Durations are written in milliseconds on disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Root configuration for a resilient client.
///
/// Omitting `retry` or `circuit_breaker` disables that layer entirely.
/// Note the asymmetry: `ClientConfig::default()` enables both layers, while an
/// empty TOML document deserializes with both set to `None`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-attempt timeout.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Retry configuration. A missing `[retry]` table disables retries.
    #[serde(default)]
    pub retry: Option<RetryConfig>,

    /// Circuit breaker configuration. A missing table disables the breaker.
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: Some(RetryConfig::default()),
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

impl ClientConfig {
    /// A configuration with both resilience layers switched off.
    pub fn pass_through() -> Self {
        Self {
            retry: None,
            circuit_breaker: None,
            ..Self::default()
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(rename = "initial_backoff_ms", with = "duration_ms")]
    pub initial_backoff: Duration,

    /// Upper bound of the exponential curve (before jitter).
    #[serde(rename = "max_backoff_ms", with = "duration_ms")]
    pub max_backoff: Duration,

    /// Exponential growth factor.
    pub multiplier: f64,

    /// Scale each delay by a uniform factor in [0.5, 1.5).
    pub jitter: bool,

    /// Status codes that trigger a retry even though a response arrived.
    pub retryable_statuses: BTreeSet<u16>,

    /// Retry transport-level failures too. Off by default: connection
    /// errors fail fast.
    pub retry_network_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
            retryable_statuses: [429, 500, 502, 503, 504].into_iter().collect(),
            retry_network_errors: false,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the retryable status set.
    pub fn with_retryable_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = u16>,
    {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_retry_network_errors(mut self, enabled: bool) -> Self {
        self.retry_network_errors = enabled;
        self
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) before opening.
    pub failure_threshold: u32,

    /// Consecutive successes (while half-open) before closing.
    pub success_threshold: u32,

    /// Time to stay open after the last failure before probing.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Serde adapter storing a `Duration` as whole milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_backoff, Duration::from_millis(100));
        assert_eq!(retry.max_backoff, Duration::from_secs(10));
        assert!(retry.jitter);
        assert!(!retry.retry_network_errors);
        assert_eq!(
            retry.retryable_statuses.iter().copied().collect::<Vec<_>>(),
            vec![429, 500, 502, 503, 504]
        );

        let breaker = config.circuit_breaker.unwrap();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.success_threshold, 2);
        assert_eq!(breaker.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_setters_round_trip() {
        let config = RetryConfig::default()
            .with_max_retries(7)
            .with_initial_backoff(Duration::from_millis(250))
            .with_retryable_statuses([503]);

        assert_eq!(config.max_retries, 7);
        assert_eq!(config.initial_backoff, Duration::from_millis(250));
        assert_eq!(config.retryable_statuses, BTreeSet::from([503]));

        // untouched fields keep their defaults
        let defaults = RetryConfig::default();
        assert_eq!(config.max_backoff, defaults.max_backoff);
        assert_eq!(config.multiplier, defaults.multiplier);
        assert_eq!(config.jitter, defaults.jitter);
        assert_eq!(config.retry_network_errors, defaults.retry_network_errors);
    }

    #[test]
    fn test_every_setter() {
        let config = RetryConfig::default()
            .with_max_retries(0)
            .with_initial_backoff(Duration::from_millis(5))
            .with_max_backoff(Duration::from_millis(50))
            .with_multiplier(3.0)
            .with_jitter(false)
            .with_retryable_statuses([502, 504])
            .with_retry_network_errors(true);

        assert_eq!(
            config,
            RetryConfig {
                max_retries: 0,
                initial_backoff: Duration::from_millis(5),
                max_backoff: Duration::from_millis(50),
                multiplier: 3.0,
                jitter: false,
                retryable_statuses: BTreeSet::from([502, 504]),
                retry_network_errors: true,
            }
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            timeout_ms = 1500

            [retry]
            max_retries = 1
            jitter = false

            [circuit_breaker]
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout, Duration::from_millis(1500));
        let retry = config.retry.unwrap();
        assert_eq!(retry.max_retries, 1);
        assert!(!retry.jitter);
        assert_eq!(retry.initial_backoff, Duration::from_millis(100));
        let breaker = config.circuit_breaker.unwrap();
        assert_eq!(breaker.timeout, Duration::from_millis(250));
        assert_eq!(breaker.failure_threshold, 5);
    }

    #[test]
    fn test_missing_tables_disable_layers() {
        let config: ClientConfig = toml::from_str("timeout_ms = 10").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(10));
        assert!(config.retry.is_none());
        assert!(config.circuit_breaker.is_none());
    }

    #[test]
    fn test_empty_toml_differs_from_default() {
        let parsed: ClientConfig = toml::from_str("").unwrap();
        let built = ClientConfig::default();
        assert_eq!(parsed.timeout, built.timeout);
        assert!(parsed.retry.is_none() && parsed.circuit_breaker.is_none());
        assert!(built.retry.is_some() && built.circuit_breaker.is_some());
    }

    #[test]
    fn test_pass_through_disables_layers() {
        let config = ClientConfig::pass_through();
        assert!(config.retry.is_none());
        assert!(config.circuit_breaker.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
