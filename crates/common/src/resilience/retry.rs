//! Retry with backoff
//!
//! Re-runs a fallible async operation a fixed number of times, waiting
//! between attempts. With backoff enabled the wait doubles per retry; the
//! final failure is returned unchanged so callers see the real error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::log_context;
use crate::logging::Logger;

/// Retry policy. Defaults to three retries starting at one second, doubling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub delay: Duration,
    pub backoff: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self { max_retries: 3, delay: Duration::from_secs(1), backoff: true }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait before the retry following failed attempt `attempt` (0-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.backoff {
            self.delay * 2u32.saturating_pow(attempt)
        } else {
            self.delay
        }
    }
}

/// Run `op`, retrying on failure per `options`.
pub async fn with_retry<F, Fut, T, E>(logger: &Logger, options: RetryOptions, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    with_retry_observed(logger, options, op, |_, _| {}).await
}

/// Like [`with_retry`], additionally invoking `on_retry` before each retry.
///
/// `on_retry` receives the 1-based number of the attempt that just failed and
/// the error it failed with. It is not called for the final failure.
pub async fn with_retry_observed<F, Fut, T, E, O>(
    logger: &Logger,
    options: RetryOptions,
    mut op: F,
    mut on_retry: O,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    O: FnMut(u32, &E),
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < options.max_retries => {
                let delay = options.delay_for(attempt);
                logger.warn(
                    format!(
                        "Retry attempt {}/{} after {}ms",
                        attempt + 1,
                        options.max_retries,
                        delay.as_millis()
                    ),
                    Some(log_context! { "error" => error.to_string() }),
                );
                on_retry(attempt + 1, &error);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                logger.error(
                    format!("Operation failed after {} retries", options.max_retries),
                    None,
                    Some(log_context! { "error" => error.to_string() }),
                );
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::config::Environment;
    use crate::logging::MemorySink;

    use super::*;

    fn quiet_logger() -> Logger {
        Logger::with_sink(Environment::Test, MemorySink::new())
    }

    fn fast() -> RetryOptions {
        RetryOptions::new().delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_does_not_retry() {
        let logger = quiet_logger();
        let calls = AtomicU32::new(0);

        let result: Result<u32, &str> = with_retry(&logger, fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Fails twice then succeeds: three invocations, observer sees attempts
    /// one and two.
    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let logger = quiet_logger();
        let calls = AtomicU32::new(0);
        let mut observed = Vec::new();

        let result: Result<&str, &str> = with_retry_observed(
            &logger,
            fast(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err("transient") } else { Ok("done") } }
            },
            |attempt, _error| observed.push(attempt),
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(observed, vec![1, 2]);
    }

    /// Exhausted retries return the last error unchanged: max_retries 2 means
    /// three invocations in total.
    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let logger = quiet_logger();
        let calls = AtomicU32::new(0);

        let result: Result<(), String> =
            with_retry(&logger, fast().max_retries(2), || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(format!("failure {n}")) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let options = RetryOptions::new().delay(Duration::from_millis(100));
        assert_eq!(options.delay_for(0), Duration::from_millis(100));
        assert_eq!(options.delay_for(1), Duration::from_millis(200));
        assert_eq!(options.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_constant_delay_without_backoff() {
        let options = RetryOptions::new().delay(Duration::from_millis(100)).backoff(false);
        assert_eq!(options.delay_for(0), Duration::from_millis(100));
        assert_eq!(options.delay_for(4), Duration::from_millis(100));
    }

    /// Each non-final failure produces one warn record naming the attempt.
    #[tokio::test]
    async fn test_retry_logging() {
        let sink = MemorySink::new();
        let logger = Logger::with_sink(Environment::Production, sink.clone());

        let _: Result<(), &str> =
            with_retry(&logger, fast().max_retries(1), || async { Err("nope") }).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Retry attempt 1/1"));
        assert!(lines[1].contains("Operation failed after 1 retries"));
    }
}
