//! Structured, leveled logging with context redaction
//!
//! Every record is a self-contained [`LogEntry`]: timestamp, level, message,
//! sanitized context, optional error details, and environment/version tags.
//! Development gets a colorized human-readable line (with a separate raw
//! error dump); every other environment gets one machine-parseable JSON line.
//!
//! The logger is constructed once and passed explicitly (`Arc<Logger>`) to
//! every component that emits, so tests can substitute a fresh instance with
//! a [`MemorySink`] per case.
//!
//! Logging can never fail: serialization problems are swallowed and sinks
//! discard write errors.

mod entry;
mod sanitize;
mod sink;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde_json::json;

pub use entry::{Context, ErrorDetails, LogEntry, LogLevel};
pub use sanitize::{sanitize_context, REDACTED};
pub use sink::{LogSink, MemorySink, StdoutSink};

use crate::config::Environment;

const COLOR_RESET: &str = "\x1b[0m";

fn color_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "\x1b[36m", // cyan
        LogLevel::Info => "\x1b[32m",  // green
        LogLevel::Warn => "\x1b[33m",  // yellow
        LogLevel::Error => "\x1b[31m", // red
    }
}

/// Build a [`Context`] from literal key/value pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works:
///
/// ```
/// use taskboard_common::log_context;
///
/// let ctx = log_context! { "userId" => "u-1", "attempt" => 3 };
/// assert_eq!(ctx["attempt"], 3);
/// ```
#[macro_export]
macro_rules! log_context {
    ($($key:literal => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::logging::Context::new();
        $(map.insert($key.to_string(), ::serde_json::json!($value));)*
        map
    }};
}

/// Structured logger with environment-gated verbosity.
///
/// Minimum emitted level per environment: development → debug, test → error,
/// production → info.
pub struct Logger {
    environment: Environment,
    version: String,
    min_level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Create a logger writing to stdout.
    pub fn new(environment: Environment) -> Self {
        Self::with_sink(environment, Arc::new(StdoutSink))
    }

    /// Create a logger with a custom sink (tests use [`MemorySink`]).
    pub fn with_sink(environment: Environment, sink: Arc<dyn LogSink>) -> Self {
        Self {
            environment,
            version: env!("CARGO_PKG_VERSION").to_string(),
            min_level: Self::min_level_for(environment),
            sink,
        }
    }

    fn min_level_for(environment: Environment) -> LogLevel {
        match environment {
            Environment::Production => LogLevel::Info,
            Environment::Test => LogLevel::Error,
            Environment::Development => LogLevel::Debug,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn debug(&self, message: impl Into<String>, context: Option<Context>) {
        self.log(LogLevel::Debug, message.into(), context, None);
    }

    pub fn info(&self, message: impl Into<String>, context: Option<Context>) {
        self.log(LogLevel::Info, message.into(), context, None);
    }

    pub fn warn(&self, message: impl Into<String>, context: Option<Context>) {
        self.log(LogLevel::Warn, message.into(), context, None);
    }

    pub fn error(
        &self,
        message: impl Into<String>,
        error: Option<ErrorDetails>,
        context: Option<Context>,
    ) {
        self.log(LogLevel::Error, message.into(), context, error);
    }

    /// HTTP access record at info level.
    pub fn http(&self, method: &str, url: &str, status_code: u16, duration_ms: u64) {
        let context = log_context! {
            "method" => method,
            "url" => url,
            "statusCode" => status_code,
            "duration" => duration_ms,
        };
        self.info(format!("HTTP {method} {url} {status_code} {duration_ms}ms"), Some(context));
    }

    /// Data-store operation record at debug level.
    pub fn database(&self, operation: &str, table: &str, duration_ms: u64) {
        let context = log_context! {
            "operation" => operation,
            "table" => table,
            "duration" => duration_ms,
        };
        self.debug(format!("DB {operation} {table} {duration_ms}ms"), Some(context));
    }

    /// Business event record at info level.
    pub fn event(&self, event_name: &str, context: Option<Context>) {
        let mut merged = context.unwrap_or_default();
        merged.insert("eventName".to_string(), json!(event_name));
        self.info(format!("Event: {event_name}"), Some(merged));
    }

    fn log(
        &self,
        level: LogLevel,
        message: String,
        context: Option<Context>,
        error: Option<ErrorDetails>,
    ) {
        if level < self.min_level {
            return;
        }

        let entry = self.build_entry(level, message, context, error);
        self.emit(&entry);
    }

    fn build_entry(
        &self,
        level: LogLevel,
        message: String,
        context: Option<Context>,
        error: Option<ErrorDetails>,
    ) -> LogEntry {
        // Stack traces carry internals; they never leave development.
        let error = error.map(|mut details| {
            if !self.environment.is_development() {
                details.stack = None;
            }
            details
        });

        LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            message,
            context: context.map(sanitize_context),
            error,
            environment: self.environment.as_str(),
            version: self.version.clone(),
        }
    }

    fn emit(&self, entry: &LogEntry) {
        if self.environment.is_development() {
            let context = entry
                .context
                .as_ref()
                .and_then(|ctx| serde_json::to_string(ctx).ok())
                .unwrap_or_default();
            let color = color_for(entry.level);
            let label = entry.level.label();
            self.sink.write_line(
                format!("{color}[{label}]{COLOR_RESET} {} {context}", entry.message).trim_end(),
            );
            if let Some(error) = &entry.error {
                self.sink.write_line(&format!("{error:?}"));
            }
            return;
        }

        // Machine-parseable single-line record; serialization failures are
        // swallowed so logging can never raise.
        if let Ok(line) = serde_json::to_string(entry) {
            self.sink.write_line(&line);
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("environment", &self.environment)
            .field("version", &self.version)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// Generate a correlation id for tracing a logical operation across records.
pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Run an async operation, logging its duration.
///
/// Success logs at debug, failure at error (with the error message); the
/// operation's result is passed through untouched either way.
pub async fn measure_performance<F, Fut, T, E>(
    logger: &Logger,
    operation: &str,
    context: Option<Context>,
    f: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let result = f().await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let mut merged = context.unwrap_or_default();
    merged.insert("operation".to_string(), json!(operation));
    merged.insert("duration".to_string(), json!(duration_ms));

    match &result {
        Ok(_) => {
            logger.debug(
                format!("Performance: {operation} completed in {duration_ms}ms"),
                Some(merged),
            );
        }
        Err(error) => {
            logger.error(
                format!("Performance: {operation} failed after {duration_ms}ms"),
                Some(ErrorDetails::new("Error", error.to_string())),
                Some(merged),
            );
        }
    }

    result
}
