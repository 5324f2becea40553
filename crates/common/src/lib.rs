//! Shared observability and resilience foundation for Taskboard services
//!
//! Everything here is infrastructure the rest of the workspace builds on:
//!
//! - [`logging`]: structured, leveled records with credential redaction and
//!   environment-gated verbosity
//! - [`metrics`]: in-process counters, gauges, and histograms with
//!   percentile estimation
//! - [`error`]: the typed error taxonomy plus central normalization of
//!   arbitrary failures
//! - [`resilience`]: retry with backoff, circuit breaking, and fallbacks
//! - [`config`]: runtime environment detection driving the above
//!
//! Components receive their [`Logger`] and [`MetricsCollector`] explicitly
//! (typically as `Arc`), so ownership of observability state stays with the
//! composition root and tests get isolated instances.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod resilience;

pub use config::Environment;
pub use error::{AppError, ErrorHandler, Failure, FieldError};
pub use logging::{Context, ErrorDetails, LogLevel, Logger};
pub use metrics::{HistogramStats, MetricsCollector, Tags};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryOptions};
