//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical call:
//!     → circuit_breaker.rs (admit once; reject fast while open)
//!     → attempt loop in http::client
//!         → backoff.rs (delay before each retry, capped then jittered)
//!     → circuit_breaker.rs (record the outcome of the whole call)
//! ```
//!
//! # Design Decisions
//! - The breaker wraps the retry loop: one admission per logical call
//! - Retries only on configured status codes; transport errors fail fast
//!   unless network-error retries are switched on
//! - Breaker tracks reachability: any received response is a success

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::RetryPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
