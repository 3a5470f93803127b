//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, durations > 0, multiplier > 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before a client is built from the config

use thiserror::Error;

use crate::config::schema::{CircuitBreakerConfig, ClientConfig, RetryConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("retry.initial_backoff_ms must be greater than zero")]
    ZeroInitialBackoff,

    #[error("retry.max_backoff_ms ({max_ms}) must be >= retry.initial_backoff_ms ({initial_ms})")]
    BackoffRange { initial_ms: u128, max_ms: u128 },

    #[error("retry.multiplier must be a finite number greater than 1.0 (got {0})")]
    Multiplier(f64),

    #[error("circuit_breaker.{field} must be at least 1")]
    Threshold { field: &'static str },

    #[error("circuit_breaker.timeout_ms must be greater than zero")]
    ZeroOpenTimeout,
}

/// Validate a full client configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeout.is_zero() {
        errors.push(ValidationError::ZeroTimeout);
    }
    if let Some(retry) = &config.retry {
        validate_retry(retry, &mut errors);
    }
    if let Some(breaker) = &config.circuit_breaker {
        validate_circuit_breaker(breaker, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_retry(retry: &RetryConfig, errors: &mut Vec<ValidationError>) {
    if retry.initial_backoff.is_zero() {
        errors.push(ValidationError::ZeroInitialBackoff);
    }
    if retry.max_backoff < retry.initial_backoff {
        errors.push(ValidationError::BackoffRange {
            initial_ms: retry.initial_backoff.as_millis(),
            max_ms: retry.max_backoff.as_millis(),
        });
    }
    if !(retry.multiplier.is_finite() && retry.multiplier > 1.0) {
        errors.push(ValidationError::Multiplier(retry.multiplier));
    }
}

fn validate_circuit_breaker(breaker: &CircuitBreakerConfig, errors: &mut Vec<ValidationError>) {
    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::Threshold {
            field: "failure_threshold",
        });
    }
    if breaker.success_threshold == 0 {
        errors.push(ValidationError::Threshold {
            field: "success_threshold",
        });
    }
    if breaker.timeout.is_zero() {
        errors.push(ValidationError::ZeroOpenTimeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
        assert!(validate_config(&ClientConfig::pass_through()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let config = ClientConfig {
            timeout: Duration::ZERO,
            retry: Some(
                RetryConfig::default()
                    .with_initial_backoff(Duration::from_secs(2))
                    .with_max_backoff(Duration::from_secs(1))
                    .with_multiplier(1.0),
            ),
            circuit_breaker: Some(CircuitBreakerConfig {
                failure_threshold: 0,
                success_threshold: 0,
                timeout: Duration::ZERO,
            }),
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroTimeout,
                ValidationError::BackoffRange {
                    initial_ms: 2000,
                    max_ms: 1000
                },
                ValidationError::Multiplier(1.0),
                ValidationError::Threshold {
                    field: "failure_threshold"
                },
                ValidationError::Threshold {
                    field: "success_threshold"
                },
                ValidationError::ZeroOpenTimeout,
            ]
        );
    }

    #[test]
    fn test_nan_multiplier_rejected() {
        let config = ClientConfig {
            retry: Some(RetryConfig::default().with_multiplier(f64::NAN)),
            ..ClientConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("multiplier"));
    }

    #[test]
    fn test_disabled_layers_are_not_checked() {
        let config = ClientConfig {
            timeout: Duration::from_secs(1),
            retry: None,
            circuit_breaker: None,
        };
        assert!(validate_config(&config).is_ok());
    }
}
