//! Transport seam: performs exactly one attempt of a request.
//!
//! # Responsibilities
//! - Define the contract the client drives (`Transport`)
//! - Provide the default `reqwest`-backed implementation
//!
//! # Design Decisions
//! - Errors are only for failures below HTTP; any status code is a response
//! - Timeouts and retries belong to the client, not the transport

use async_trait::async_trait;
use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::Response;

/// Failure to obtain any response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("attempt timed out")]
    TimedOut,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("call cancelled")]
    Cancelled,
}

impl TransportError {
    /// Whether this failure is about time running out rather than reachability.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::TimedOut | TransportError::DeadlineExceeded | TransportError::Cancelled
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::TimedOut
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Performs a single attempt of a request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn attempt(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Default transport over a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Reuse an existing, preconfigured `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn attempt(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.target())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body.to_vec()))
    }
}
