//! Context redaction
//!
//! Log context frequently carries request-scoped fields (user ids, task ids,
//! correlation ids) next to credentials that must never reach a log sink.
//! Redaction matches on key names, not values: any key that case-insensitively
//! contains one of the sensitive substrings is replaced wholesale.

use serde_json::Value;

use super::entry::Context;

/// Replacement marker written in place of redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Key substrings that trigger redaction (case-insensitive containment).
const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "apikey", "secret", "authorization"];

fn is_sensitive(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|sensitive| lowered.contains(sensitive))
}

/// Redact sensitive entries from a context map.
///
/// Non-matching keys pass through unchanged, values included.
pub fn sanitize_context(context: Context) -> Context {
    context
        .into_iter()
        .map(|(key, value)| {
            if is_sensitive(&key) {
                (key, Value::String(REDACTED.to_string()))
            } else {
                (key, value)
            }
        })
        .collect()
}
