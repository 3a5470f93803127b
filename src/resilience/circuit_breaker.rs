//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: probing whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failures >= failure_threshold (any success resets the count)
//! Open → Half-Open: first admit() after timeout has elapsed since the last failure
//! Half-Open → Closed: successes >= success_threshold
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - One breaker per downstream dependency, shared through `Arc`
//! - A single `RwLock` guards all state; admit/record hold the write lock
//!   for the whole transition, getters take the read lock
//! - Transition events are logged after the lock is released

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::observability::logging::{self, Logger};
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure_time: Option<Instant>,
    last_state_change: Instant,
}

/// A state change, captured under the lock and reported after it is released.
#[derive(Debug, Clone, Copy)]
struct Transition {
    from: CircuitState,
    to: CircuitState,
    failures: u32,
    successes: u32,
}

impl BreakerState {
    fn set_state(&mut self, to: CircuitState, now: Instant) -> Transition {
        let transition = Transition {
            from: self.state,
            to,
            failures: self.failures,
            successes: self.successes,
        };

        self.state = to;
        self.last_state_change = now;
        match to {
            CircuitState::Closed => {
                self.failures = 0;
                self.successes = 0;
            }
            // failures are kept as the reason the circuit opened
            CircuitState::HalfOpen => self.successes = 0,
            CircuitState::Open => {}
        }
        transition
    }
}

/// Three-state circuit breaker.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    logger: Arc<dyn Logger>,
    inner: RwLock<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker that logs nowhere.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_logger(config, logging::noop())
    }

    pub fn with_logger(config: CircuitBreakerConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            logger,
            inner: RwLock::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                last_failure_time: None,
                last_state_change: Instant::now(),
            }),
        }
    }

    /// Decide whether a call may proceed.
    ///
    /// An open breaker whose timeout has elapsed moves to half-open and
    /// admits the caller as a probe.
    pub fn admit(&self) -> bool {
        let now = Instant::now();
        let (allowed, transition) = {
            let mut inner = self.write();
            let state = inner.state;
            match state {
                CircuitState::Closed | CircuitState::HalfOpen => (true, None),
                CircuitState::Open => {
                    let elapsed = inner
                        .last_failure_time
                        .map_or(Duration::MAX, |at| now.saturating_duration_since(at));
                    if elapsed >= self.config.timeout {
                        (true, Some(inner.set_state(CircuitState::HalfOpen, now)))
                    } else {
                        (false, None)
                    }
                }
            }
        };

        if let Some(transition) = transition {
            self.report(transition);
        }
        if !allowed {
            metrics::record_rejection();
        }
        allowed
    }

    /// Record the outcome of an admitted call.
    pub fn record(&self, success: bool) {
        let now = Instant::now();
        let transition = {
            let mut inner = self.write();
            let state = inner.state;
            if success {
                match state {
                    CircuitState::Closed => {
                        inner.failures = 0;
                        None
                    }
                    CircuitState::HalfOpen => {
                        inner.successes += 1;
                        (inner.successes >= self.config.success_threshold)
                            .then(|| inner.set_state(CircuitState::Closed, now))
                    }
                    // a call admitted before the breaker opened finished late
                    CircuitState::Open => None,
                }
            } else {
                inner.failures = inner.failures.saturating_add(1);
                inner.last_failure_time = Some(now);
                match state {
                    CircuitState::Closed => (inner.failures >= self.config.failure_threshold)
                        .then(|| inner.set_state(CircuitState::Open, now)),
                    CircuitState::HalfOpen => Some(inner.set_state(CircuitState::Open, now)),
                    CircuitState::Open => None,
                }
            }
        };

        if let Some(transition) = transition {
            self.report(transition);
        }
    }

    pub fn state(&self) -> CircuitState {
        self.read().state
    }

    pub fn failures(&self) -> u32 {
        self.read().failures
    }

    /// Consecutive successes; only meaningful while half-open.
    pub fn successes(&self) -> u32 {
        self.read().successes
    }

    pub fn last_failure_time(&self) -> Option<Instant> {
        self.read().last_failure_time
    }

    pub fn last_state_change(&self) -> Instant {
        self.read().last_state_change
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn report(&self, t: Transition) {
        self.logger.info(format_args!(
            "Circuit breaker state changed: {} -> {} (failures: {}, successes: {})",
            t.from, t.to, t.failures, t.successes
        ));
        metrics::record_state_transition(t.from.as_str(), t.to.as_str());
    }

    // The critical sections never panic, so a poisoned lock still holds consistent state.
    fn read(&self) -> RwLockReadGuard<'_, BreakerState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BreakerState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("CircuitBreaker")
            .field("state", &inner.state)
            .field("failures", &inner.failures)
            .field("successes", &inner.successes)
            .field("config", &self.config)
            .finish()
    }
}
