//! Resilient client: circuit breaker around a retry loop around a transport.
//!
//! # Responsibilities
//! - Admit each logical call through the circuit breaker exactly once
//! - Drive attempts, retrying retryable statuses with backoff
//! - Fail fast on transport errors (unless network retries are enabled)
//! - Race every attempt and backoff sleep against the request's deadline/cancellation
//! - Report the outcome of the call back to the breaker
//!
//! # Design Decisions
//! - A response with a retryable status that survives every retry is returned, not an error
//! - The breaker tracks reachability: any received response counts as a success
//! - Disabled layers are explicit (`Guard::Disabled`, `RetryPolicy::disabled()`)

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use reqwest::header::HeaderMap;
use reqwest::Method;

use crate::config::{validate_config, ClientConfig, ValidationError};
use crate::error::{HttpError, HttpResult};
use crate::http::context::CallContext;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::transport::{ReqwestTransport, Transport, TransportError};
use crate::observability::logging::{self, Logger};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Error building a [`Client`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid client configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Admission control, with an explicit variant for "no breaker configured".
enum Guard {
    Disabled,
    Breaker(Arc<CircuitBreaker>),
}

impl Guard {
    fn admit(&self) -> bool {
        match self {
            Guard::Disabled => true,
            Guard::Breaker(cb) => cb.admit(),
        }
    }

    fn record(&self, success: bool) {
        if let Guard::Breaker(cb) = self {
            cb.record(success);
        }
    }
}

/// An admitted call whose outcome has not been recorded yet.
///
/// Dropped unfinished (the transport panicked, or the caller dropped the
/// `execute` future), it records a failure so a half-open probe is never lost.
struct PendingOutcome<'a> {
    guard: &'a Guard,
    armed: bool,
}

impl<'a> PendingOutcome<'a> {
    fn new(guard: &'a Guard) -> Self {
        Self { guard, armed: true }
    }

    fn finish(mut self, success: bool) {
        self.armed = false;
        self.guard.record(success);
    }
}

impl Drop for PendingOutcome<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.guard.record(false);
        }
    }
}

/// HTTP client with retry and circuit breaker support.
///
/// A panicking [`Transport`] is outside the contract: the panic propagates to
/// the caller, but the breaker still records the call as a failure.
pub struct Client {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    guard: Guard,
    timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl Client {
    /// Build a client over the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, BuildError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The breaker guarding this client, if one is configured.
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        match &self.guard {
            Guard::Disabled => None,
            Guard::Breaker(cb) => Some(cb),
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute a request through the breaker and the retry loop.
    pub async fn execute(&self, request: Request) -> HttpResult<Response> {
        let start = Instant::now();
        let method = request.method().clone();

        if !self.guard.admit() {
            self.logger.warn(format_args!(
                "Circuit breaker is open, rejecting {} {}",
                method,
                request.target()
            ));
            metrics::record_request(method.as_str(), "CIRCUIT_BREAKER_OPEN", start);
            return Err(HttpError::CircuitOpen {
                method,
                target: request.target().to_string(),
            });
        }

        let pending = PendingOutcome::new(&self.guard);
        let result = self.run_attempts(&request).await;
        pending.finish(result.is_ok());

        let label = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        metrics::record_request(method.as_str(), label, start);
        result
    }

    /// Execute and decode a JSON body. A decode failure is `InvalidResponse`, never a retry.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: Request) -> HttpResult<T> {
        let method = request.method().clone();
        let target = request.target().to_string();
        let response = self.execute(request).await?;

        response.json().map_err(|source| {
            self.logger.warn(format_args!(
                "Failed to decode response from {} {} (status {}): {}",
                method,
                target,
                response.status(),
                source
            ));
            HttpError::InvalidResponse {
                method,
                target,
                status: response.status(),
                retries: response.retries(),
                source,
            }
        })
    }

    pub async fn get(&self, ctx: CallContext, target: &str, headers: HeaderMap) -> HttpResult<Response> {
        self.execute(Self::prepare(Method::GET, ctx, target, headers, None))
            .await
    }

    pub async fn post(
        &self,
        ctx: CallContext,
        target: &str,
        body: impl Into<Vec<u8>>,
        headers: HeaderMap,
    ) -> HttpResult<Response> {
        self.execute(Self::prepare(Method::POST, ctx, target, headers, Some(body.into())))
            .await
    }

    pub async fn put(
        &self,
        ctx: CallContext,
        target: &str,
        body: impl Into<Vec<u8>>,
        headers: HeaderMap,
    ) -> HttpResult<Response> {
        self.execute(Self::prepare(Method::PUT, ctx, target, headers, Some(body.into())))
            .await
    }

    pub async fn patch(
        &self,
        ctx: CallContext,
        target: &str,
        body: impl Into<Vec<u8>>,
        headers: HeaderMap,
    ) -> HttpResult<Response> {
        self.execute(Self::prepare(Method::PATCH, ctx, target, headers, Some(body.into())))
            .await
    }

    pub async fn delete(&self, ctx: CallContext, target: &str, headers: HeaderMap) -> HttpResult<Response> {
        self.execute(Self::prepare(Method::DELETE, ctx, target, headers, None))
            .await
    }

    fn prepare(
        method: Method,
        ctx: CallContext,
        target: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Request {
        let request = Request::new(method, target)
            .with_headers(headers)
            .with_context(ctx);
        match body {
            Some(body) => request.with_body(body),
            None => request,
        }
    }

    async fn run_attempts(&self, request: &Request) -> HttpResult<Response> {
        let max_retries = self.retry.max_retries();
        let mut attempt: u32 = 0;

        loop {
            match self.attempt_once(request).await {
                Ok(response) => {
                    let status = response.status();
                    if !self.retry.is_retryable_status(status) {
                        return Ok(response.with_retries(attempt));
                    }
                    if attempt >= max_retries {
                        if max_retries > 0 {
                            self.logger.warn(format_args!(
                                "Retries exhausted for {} {}, returning last response (status {})",
                                request.method(),
                                request.target(),
                                status
                            ));
                        }
                        return Ok(response.with_retries(attempt));
                    }

                    let delay = self.retry.backoff(attempt);
                    self.logger.info(format_args!(
                        "Retrying request in {:?} (attempt {}/{}, status {})",
                        delay,
                        attempt + 1,
                        max_retries,
                        status
                    ));
                    self.pause(request, delay, attempt).await?;
                }
                Err(source) if source.is_timeout() => {
                    return Err(HttpError::Timeout {
                        method: request.method().clone(),
                        target: request.target().to_string(),
                        retries: attempt,
                        source,
                    });
                }
                Err(source) => {
                    if !self.retry.retries_network_errors() || max_retries == 0 {
                        return Err(HttpError::Network {
                            method: request.method().clone(),
                            target: request.target().to_string(),
                            retries: attempt,
                            source,
                        });
                    }
                    if attempt >= max_retries {
                        return Err(HttpError::MaxRetriesExceeded {
                            method: request.method().clone(),
                            target: request.target().to_string(),
                            retries: attempt,
                            source,
                        });
                    }

                    let delay = self.retry.backoff(attempt);
                    self.logger.info(format_args!(
                        "Retrying request in {:?} (attempt {}/{}, error: {})",
                        delay,
                        attempt + 1,
                        max_retries,
                        source
                    ));
                    self.pause(request, delay, attempt).await?;
                }
            }
            attempt += 1;
        }
    }

    /// One transport attempt, bounded by the per-attempt timeout and the request context.
    async fn attempt_once(&self, request: &Request) -> Result<Response, TransportError> {
        let ctx = request.context();
        if ctx.is_done() {
            return Err(context_error(ctx));
        }

        self.logger.debug(format_args!("HTTP {} {}", request.method(), request.target()));
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = ctx.done() => Err(context_error(ctx)),
            res = tokio::time::timeout(self.timeout, self.transport.attempt(request)) => {
                res.unwrap_or(Err(TransportError::TimedOut))
            }
        };

        match outcome {
            Ok(response) => {
                let elapsed = start.elapsed();
                self.logger.debug(format_args!(
                    "HTTP {} {} (took {:?})",
                    response.status(),
                    request.target(),
                    elapsed
                ));
                metrics::record_attempt("response");
                Ok(response.with_elapsed(elapsed))
            }
            Err(e) => {
                self.logger.error(format_args!(
                    "Request failed: {} {}: {}",
                    request.method(),
                    request.target(),
                    e
                ));
                metrics::record_attempt(if e.is_timeout() { "timeout" } else { "network_error" });
                Err(e)
            }
        }
    }

    /// Sleep before the next attempt unless the request context ends first.
    async fn pause(&self, request: &Request, delay: Duration, attempt: u32) -> HttpResult<()> {
        metrics::record_retry();
        let ctx = request.context();
        tokio::select! {
            biased;
            _ = ctx.done() => Err(HttpError::Timeout {
                method: request.method().clone(),
                target: request.target().to_string(),
                retries: attempt,
                source: context_error(ctx),
            }),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn context_error(ctx: &CallContext) -> TransportError {
    if ctx.is_cancelled() {
        TransportError::Cancelled
    } else {
        TransportError::DeadlineExceeded
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("retry", &self.retry)
            .field("circuit_breaker", &self.circuit_breaker())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    logger: Option<Arc<dyn Logger>>,
    transport: Option<Arc<dyn Transport>>,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share an existing breaker, e.g. between clients calling the same dependency.
    /// Takes precedence over `config.circuit_breaker`.
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn build(self) -> Result<Client, BuildError> {
        validate_config(&self.config).map_err(BuildError::Config)?;

        let logger = self.logger.unwrap_or_else(logging::noop);
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let retry = self
            .config
            .retry
            .as_ref()
            .map_or_else(RetryPolicy::disabled, RetryPolicy::new);
        let guard = match (self.breaker, self.config.circuit_breaker) {
            (Some(shared), _) => Guard::Breaker(shared),
            (None, Some(cfg)) => Guard::Breaker(Arc::new(CircuitBreaker::with_logger(cfg, logger.clone()))),
            (None, None) => Guard::Disabled,
        };

        Ok(Client {
            transport,
            retry,
            guard,
            timeout: self.config.timeout,
            logger,
        })
    }
}
