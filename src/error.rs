//! Error taxonomy for client calls.

use reqwest::Method;
use thiserror::Error;

use crate::http::transport::TransportError;

/// Errors returned by [`Client`](crate::http::Client).
///
/// Every variant carries the method and target of the call and the number of
/// retries performed before it failed.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The transport failed before any response was received.
    #[error("[NETWORK_ERROR] Network request failed: {source} ({method} {target}, retries: {retries})")]
    Network {
        method: Method,
        target: String,
        retries: u32,
        #[source]
        source: TransportError,
    },

    /// The caller's deadline passed, the call was cancelled, or an attempt timed out.
    #[error("[TIMEOUT] Request timeout: {source} ({method} {target}, retries: {retries})")]
    Timeout {
        method: Method,
        target: String,
        retries: u32,
        #[source]
        source: TransportError,
    },

    /// The circuit breaker refused the call.
    #[error("[CIRCUIT_BREAKER_OPEN] Circuit breaker is open ({method} {target}, retries: 0)")]
    CircuitOpen { method: Method, target: String },

    /// The response body could not be decoded.
    #[error("[INVALID_RESPONSE] Invalid response received: {source} (HTTP {status} {method} {target}, retries: {retries})")]
    InvalidResponse {
        method: Method,
        target: String,
        status: u16,
        retries: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Network-error retries were enabled and all of them failed.
    #[error("[MAX_RETRIES_EXCEEDED] Maximum retry attempts exceeded: {source} ({method} {target}, retries: {retries})")]
    MaxRetriesExceeded {
        method: Method,
        target: String,
        retries: u32,
        #[source]
        source: TransportError,
    },
}

/// Result type for client calls.
pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    /// Stable machine-readable code for alerting.
    pub fn code(&self) -> &'static str {
        match self {
            HttpError::Network { .. } => "NETWORK_ERROR",
            HttpError::Timeout { .. } => "TIMEOUT",
            HttpError::CircuitOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            HttpError::InvalidResponse { .. } => "INVALID_RESPONSE",
            HttpError::MaxRetriesExceeded { .. } => "MAX_RETRIES_EXCEEDED",
        }
    }

    pub fn method(&self) -> &Method {
        match self {
            HttpError::Network { method, .. }
            | HttpError::Timeout { method, .. }
            | HttpError::CircuitOpen { method, .. }
            | HttpError::InvalidResponse { method, .. }
            | HttpError::MaxRetriesExceeded { method, .. } => method,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            HttpError::Network { target, .. }
            | HttpError::Timeout { target, .. }
            | HttpError::CircuitOpen { target, .. }
            | HttpError::InvalidResponse { target, .. }
            | HttpError::MaxRetriesExceeded { target, .. } => target,
        }
    }

    /// Retries performed before the call failed.
    pub fn retry_count(&self) -> u32 {
        match self {
            HttpError::CircuitOpen { .. } => 0,
            HttpError::Network { retries, .. }
            | HttpError::Timeout { retries, .. }
            | HttpError::InvalidResponse { retries, .. }
            | HttpError::MaxRetriesExceeded { retries, .. } => *retries,
        }
    }

    /// The transport error behind this failure, if there is one.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            HttpError::Network { source, .. }
            | HttpError::Timeout { source, .. }
            | HttpError::MaxRetriesExceeded { source, .. } => Some(source),
            HttpError::CircuitOpen { .. } | HttpError::InvalidResponse { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Timeout { .. })
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, HttpError::CircuitOpen { .. })
    }
}
