//! Resilience primitives for calling unreliable dependencies
//!
//! Three composable layers: retry with backoff for transient failures, a
//! circuit breaker to stop hammering a dependency that keeps failing, and a
//! fallback wrapper for callers that can degrade instead of erroring.

mod circuit_breaker;
mod clock;
mod fallback;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use clock::{Clock, MockClock, SystemClock};
pub use fallback::with_fallback;
pub use retry::{with_retry, with_retry_observed, RetryOptions};
