//! Log record types
//!
//! One [`LogEntry`] is built per log call, immutable once built, and emitted
//! as a single self-contained record. Nothing here is persisted by this crate.

use serde::Serialize;

/// Structured context attached to a log record.
///
/// Keys are sorted, which keeps serialized records deterministic.
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Uppercase label used by the human-readable output format.
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Details of an error attached to a log record.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetails {
    pub name: String,
    pub message: String,
    /// Rendered source chain; only emitted in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetails {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), message: message.into(), stack: None }
    }

    /// Capture a foreign error, rendering its source chain into `stack`.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = format!("Error: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {cause}"));
            source = cause.source();
        }

        Self { name: "Error".to_string(), message: error.to_string(), stack: Some(stack) }
    }
}

/// A single structured log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    pub environment: &'static str,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
        assert_eq!(serde_json::to_string(&LogLevel::Debug).unwrap(), "\"debug\"");
    }

    /// Validates that optional fields are omitted from serialized records
    /// rather than emitted as nulls.
    #[test]
    fn test_log_entry_omits_empty_fields() {
        let entry = LogEntry {
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            level: LogLevel::Info,
            message: "hello".to_string(),
            context: None,
            error: None,
            environment: "test",
            version: "0.1.0".to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("context").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["level"], "info");
        assert_eq!(json["environment"], "test");
    }

    #[test]
    fn test_error_details_renders_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk offline");
        let details = ErrorDetails::from_error(&inner);

        assert_eq!(details.name, "Error");
        assert_eq!(details.message, "disk offline");
        let stack = details.stack.unwrap();
        assert!(stack.starts_with("Error: disk offline"));
    }
}
