//! Circuit breaker
//!
//! Stops calling a failing dependency once consecutive failures reach a
//! threshold, rejecting fast while open. After a recovery timeout a single
//! probe call is allowed through; its outcome decides whether the circuit
//! closes again or stays open.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::error::AppError;
use crate::log_context;
use crate::logging::Logger;

use super::clock::{Clock, SystemClock};

/// Breaker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Threshold reached, calls are rejected without being attempted.
    Open,
    /// Recovery timeout elapsed, the next call probes the dependency.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        })
    }
}

/// Breaker tuning. Defaults to five consecutive failures and a one-minute
/// recovery timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, recovery_timeout: Duration::from_secs(60) }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold.max(1);
        self
    }

    pub fn recovery_timeout(mut self, recovery_timeout: Duration) -> Self {
        self.recovery_timeout = recovery_timeout;
        self
    }
}

/// Circuit breaker guarding one dependency.
///
/// Shared behind an [`Arc`]; all methods take `&self`.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitState>,
    failure_count: AtomicU32,
    last_failure: RwLock<Option<Instant>>,
    clock: C,
    logger: Arc<Logger>,
}

impl CircuitBreaker<SystemClock> {
    pub fn new(config: CircuitBreakerConfig, logger: Arc<Logger>) -> Self {
        Self::with_clock(config, logger, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(config: CircuitBreakerConfig, logger: Arc<Logger>, clock: C) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            last_failure: RwLock::new(None),
            clock,
            logger,
        }
    }

    /// Run `op` through the breaker.
    ///
    /// While open and inside the recovery timeout, `op` is not invoked and
    /// the call fails with an external-service error attributed to the
    /// breaker itself. Failures of `op` pass through unchanged after being
    /// counted.
    pub async fn execute<F, Fut, T>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        if *self.state.read() == CircuitState::Open {
            if self.recovery_elapsed() {
                *self.state.write() = CircuitState::HalfOpen;
                self.logger.info("Circuit breaker entering half-open state", None);
            } else {
                return Err(AppError::external_service_with_message(
                    "Circuit Breaker",
                    "Service temporarily unavailable",
                ));
            }
        }

        match op().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                Err(error)
            }
        }
    }

    fn recovery_elapsed(&self) -> bool {
        match *self.last_failure.read() {
            Some(at) => self.clock.now().duration_since(at) > self.config.recovery_timeout,
            None => true,
        }
    }

    fn on_success(&self) {
        self.failure_count.store(0, Ordering::SeqCst);
        let mut state = self.state.write();
        if *state == CircuitState::HalfOpen {
            self.logger.info("Circuit breaker closed", None);
        }
        *state = CircuitState::Closed;
    }

    fn on_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_failure.write() = Some(self.clock.now());

        if failures >= self.config.failure_threshold {
            let mut state = self.state.write();
            if *state != CircuitState::Open {
                *state = CircuitState::Open;
                self.logger.warn(
                    "Circuit breaker opened",
                    Some(log_context! { "failureCount" => failures }),
                );
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        *self.state.read()
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::SeqCst)
    }
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("failure_count", &self.failure_count())
            .finish_non_exhaustive()
    }
}
