//! HTTP call subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, target, headers, body, CallContext)
//!     → client.rs (circuit breaker admission)
//!     → client.rs (retry loop, backoff sleeps raced against the context)
//!     → transport.rs (one attempt, bounded by the per-attempt timeout)
//!     → Response | HttpError
//! ```

pub mod client;
pub mod context;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{BuildError, Client, ClientBuilder};
pub use context::{CallContext, Canceller};
pub use request::Request;
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportError};
