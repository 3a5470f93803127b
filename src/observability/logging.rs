//! Structured logging.
//!
//! # Responsibilities
//! - Define the `Logger` sink the client and circuit breaker write to
//! - Provide a silent default and a `tracing`-backed implementation
//! - Initialize the subscriber for the binary
//!
//! # Design Decisions
//! - The library never chooses a log destination; callers inject one
//! - `NoopLogger` is the default so an unconfigured client is silent
//! - Messages are passed as `fmt::Arguments` and only formatted if the sink wants them

use std::fmt;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Severity-levelled log sink.
///
/// Call sites pass `format_args!(...)`, so a sink that discards a level pays
/// no formatting cost.
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Logger that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
    fn warn(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

/// Logger that forwards to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "resilient_client", "{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "resilient_client", "{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "resilient_client", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "resilient_client", "{}", args);
    }
}

/// Shared handle to the default silent logger.
pub fn noop() -> Arc<dyn Logger> {
    Arc::new(NoopLogger)
}

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is harmless.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
