//! Metrics collection.
//!
//! # Metrics
//! - `client_attempts_total` (counter): transport attempts by outcome
//! - `client_retries_total` (counter): backoff sleeps taken
//! - `client_request_duration_seconds` (histogram): logical call latency
//! - `circuit_breaker_transitions_total` (counter): by from/to state
//! - `circuit_breaker_rejections_total` (counter): calls refused while open
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Labels are static strings, except the request method

use std::time::Instant;

/// Record one transport attempt. `outcome` is `"response"`, `"network_error"` or `"timeout"`.
pub fn record_attempt(outcome: &'static str) {
    metrics::counter!("client_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a retry (a backoff sleep about to happen).
pub fn record_retry() {
    metrics::counter!("client_retries_total").increment(1);
}

/// Record the latency of a full logical call.
pub fn record_request(method: &str, result: &'static str, start: Instant) {
    metrics::histogram!(
        "client_request_duration_seconds",
        "method" => method.to_string(),
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a breaker state change.
pub fn record_state_transition(from: &'static str, to: &'static str) {
    metrics::counter!("circuit_breaker_transitions_total", "from" => from, "to" => to)
        .increment(1);
}

/// Record a call rejected by an open breaker.
pub fn record_rejection() {
    metrics::counter!("circuit_breaker_rejections_total").increment(1);
}
