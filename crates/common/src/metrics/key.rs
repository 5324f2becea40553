//! Metric key encoding
//!
//! A metric series is identified by its name plus its tag set. Tags are
//! flattened into the storage key as `name{k1:v1,k2:v2}` with keys sorted,
//! so the same tag set always maps to the same series regardless of the
//! order the caller supplied it in.

use std::collections::BTreeMap;

/// Tag set for one metric series. Ordered so key rendering is deterministic.
pub type Tags = BTreeMap<String, String>;

/// Render the storage key for a name and optional tag set.
///
/// An absent or empty tag set yields the bare name, not `name{}`.
pub fn metric_key(name: &str, tags: Option<&Tags>) -> String {
    match tags {
        Some(tags) if !tags.is_empty() => {
            let rendered = tags
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(",");
            format!("{name}{{{rendered}}}")
        }
        _ => name.to_string(),
    }
}

/// Build a [`Tags`] map from `"key" => "value"` pairs.
#[macro_export]
macro_rules! metric_tags {
    { $( $key:expr => $value:expr ),* $(,)? } => {{
        let mut tags = $crate::metrics::Tags::new();
        $( tags.insert($key.to_string(), $value.to_string()); )*
        tags
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_without_tags() {
        assert_eq!(metric_key("api.request.count", None), "api.request.count");
        assert_eq!(metric_key("api.request.count", Some(&Tags::new())), "api.request.count");
    }

    /// Tag keys are sorted, so insertion order does not split the series.
    #[test]
    fn test_tags_are_sorted_into_the_key() {
        let forward = metric_tags! { "method" => "GET", "endpoint" => "/tasks" };
        let reverse = metric_tags! { "endpoint" => "/tasks", "method" => "GET" };

        let expected = "api.request.count{endpoint:/tasks,method:GET}";
        assert_eq!(metric_key("api.request.count", Some(&forward)), expected);
        assert_eq!(metric_key("api.request.count", Some(&reverse)), expected);
    }

    #[test]
    fn test_single_tag() {
        let tags = metric_tags! { "status" => "500" };
        assert_eq!(metric_key("api.request.errors", Some(&tags)), "api.request.errors{status:500}");
    }
}
