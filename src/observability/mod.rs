//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! client + circuit breaker produce:
//!     → logging.rs (Logger sink: retries, state transitions, failures)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Logging goes through an injected sink, never a global choice
//! - Metrics are cheap (facade no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;

pub use logging::{Logger, NoopLogger, TracingLogger};
