//! Resilient HTTP client library.
//!
//! Wraps outbound calls in a circuit breaker and a retry loop with
//! exponential backoff and jitter, with per-call deadlines and cancellation.

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod resilience;

pub use config::{CircuitBreakerConfig, ClientConfig, RetryConfig};
pub use error::{HttpError, HttpResult};
pub use http::{CallContext, Canceller, Client, ClientBuilder, Request, Response};
pub use observability::{Logger, NoopLogger, TracingLogger};
pub use resilience::{CircuitBreaker, CircuitState, RetryPolicy};
