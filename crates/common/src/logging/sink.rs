//! Log sinks
//!
//! The logger formats records and hands completed lines to a [`LogSink`].
//! Shipping records to an external aggregation service is a collaborator's
//! job; the sinks here only cover local output and test capture.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for formatted log lines.
///
/// Implementations must never panic or propagate write failures; the logger
/// guarantees that logging cannot raise.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Default sink: one line per record on stdout. Write errors are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

/// In-memory sink for asserting on emitted records in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of every line written so far, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_lines_in_order() {
        let sink = MemorySink::new();
        sink.write_line("first");
        sink.write_line("second");

        assert_eq!(sink.lines(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_memory_sink_clear() {
        let sink = MemorySink::new();
        sink.write_line("line");
        assert!(!sink.is_empty());

        sink.clear();
        assert!(sink.is_empty());
    }
}
