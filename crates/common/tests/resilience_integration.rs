//! Scenario tests for the resilience primitives composed with the logger,
//! covering recovery, exhaustion, circuit lifecycle, and graceful
//! degradation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_test::{assert_err, assert_ok};

use taskboard_common::config::Environment;
use taskboard_common::logging::{MemorySink, Logger};
use taskboard_common::resilience::{
    with_fallback, with_retry, with_retry_observed, CircuitBreaker, CircuitBreakerConfig,
    CircuitState, MockClock, RetryOptions,
};
use taskboard_common::{log_context, AppError};

fn quiet_logger() -> Arc<Logger> {
    Arc::new(Logger::with_sink(Environment::Test, MemorySink::new()))
}

fn production_logger() -> (Arc<Logger>, Arc<MemorySink>) {
    let sink = MemorySink::new();
    (Arc::new(Logger::with_sink(Environment::Production, sink.clone())), sink)
}

fn fast_retry() -> RetryOptions {
    RetryOptions::new().delay(Duration::from_millis(1))
}

/// An operation that fails twice then succeeds is invoked three times, and
/// the retry observer sees attempts one and two.
#[tokio::test]
async fn retry_recovers_and_reports_attempts() {
    let logger = quiet_logger();
    let calls = AtomicU32::new(0);
    let mut attempts = Vec::new();

    let result: Result<&str, &str> = with_retry_observed(
        &logger,
        fast_retry(),
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err("ECONNRESET") } else { Ok("saved") } }
        },
        |attempt, error| {
            assert_eq!(*error, "ECONNRESET");
            attempts.push(attempt);
        },
    )
    .await;

    assert_eq!(result.unwrap(), "saved");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(attempts, vec![1, 2]);
}

/// An operation that never succeeds is invoked once plus one per retry, and
/// the caller receives the final error untouched.
#[tokio::test]
async fn retry_exhaustion_returns_original_error() {
    let logger = quiet_logger();
    let calls = AtomicU32::new(0);

    let result: Result<(), AppError> = with_retry(&logger, fast_retry().max_retries(2), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(AppError::database("Database error")) }
    })
    .await;

    let error = result.unwrap_err();
    assert_eq!(error.name(), "DatabaseError");
    assert_eq!(error.status_code(), 500);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// Full circuit lifecycle: five consecutive failures open the circuit, the
/// sixth call is rejected without running, and after the recovery timeout a
/// successful probe closes it again.
#[tokio::test]
async fn circuit_breaker_lifecycle() {
    let clock = MockClock::new();
    let logger = quiet_logger();
    let config = CircuitBreakerConfig::new()
        .failure_threshold(5)
        .recovery_timeout(Duration::from_secs(60));
    let breaker = CircuitBreaker::with_clock(config, logger, clock.clone());

    for _ in 0..5 {
        let error = breaker
            .execute(|| async { Err::<(), _>(AppError::external_service("Supabase")) })
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Supabase service unavailable");
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(breaker.failure_count(), 5);

    // Rejected fast while open; the operation must not run.
    let invoked = AtomicU32::new(0);
    let rejection = breaker
        .execute(|| {
            invoked.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AppError>(()) }
        })
        .await
        .unwrap_err();
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    assert_eq!(rejection.to_string(), "Service temporarily unavailable");
    assert_eq!(rejection.context().unwrap()["service"], "Circuit Breaker");

    // Past the recovery timeout the probe runs and closes the circuit.
    clock.advance(Duration::from_secs(61));
    let result = breaker.execute(|| async { Ok::<_, AppError>("healthy") }).await;
    assert_eq!(tokio_test::assert_ok!(result), "healthy");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

/// Opening and closing the circuit leaves an audit trail in the log.
#[tokio::test]
async fn circuit_breaker_transitions_are_logged() {
    let clock = MockClock::new();
    let (logger, sink) = production_logger();
    let config = CircuitBreakerConfig::new()
        .failure_threshold(2)
        .recovery_timeout(Duration::from_secs(1));
    let breaker = CircuitBreaker::with_clock(config, logger, clock.clone());

    for _ in 0..2 {
        let _ = breaker
            .execute(|| async { Err::<(), _>(AppError::external_service("Supabase")) })
            .await;
    }
    clock.advance(Duration::from_secs(2));
    let _ = breaker.execute(|| async { Ok::<_, AppError>(()) }).await;

    let messages: Vec<String> = sink
        .lines()
        .iter()
        .map(|line| {
            let record: Value = serde_json::from_str(line).unwrap();
            record["message"].as_str().unwrap().to_string()
        })
        .collect();

    assert!(messages.contains(&"Circuit breaker opened".to_string()));
    assert!(messages.contains(&"Circuit breaker entering half-open state".to_string()));
    assert!(messages.contains(&"Circuit breaker closed".to_string()));
}

/// A failing read degrades to its fallback value with exactly one warning
/// record naming the operation and the error.
#[tokio::test]
async fn fallback_degrades_with_single_warning() {
    let (logger, sink) = production_logger();

    let tasks = with_fallback(
        &logger,
        || async { Err::<Vec<&str>, _>(AppError::external_service("Supabase")) },
        Vec::new(),
        Some(log_context! { "operation" => "listTasks" }),
    )
    .await;

    assert!(tasks.is_empty());
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    let record: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["level"], "warn");
    assert_eq!(record["message"], "Operation failed, using fallback");
    assert_eq!(record["context"]["error"], "Supabase service unavailable");
    assert_eq!(record["context"]["operation"], "listTasks");
}

/// Retry inside a circuit breaker: retries exhaust against a dead dependency,
/// each attempt counts toward the breaker threshold.
#[tokio::test]
async fn retry_failures_feed_the_breaker() {
    let logger = quiet_logger();
    let breaker = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::new().failure_threshold(3),
        logger.clone(),
    ));

    let result: Result<(), AppError> = with_retry(&logger, fast_retry().max_retries(2), || {
        let breaker = breaker.clone();
        async move {
            breaker
                .execute(|| async { Err::<(), _>(AppError::external_service("Supabase")) })
                .await
        }
    })
    .await;

    tokio_test::assert_err!(result);
    // Three invocations, threshold three: the breaker is now open.
    assert_eq!(breaker.state(), CircuitState::Open);
}
