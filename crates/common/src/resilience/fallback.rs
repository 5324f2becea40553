//! Fallback wrapper
//!
//! Converts a fallible async operation into an infallible one by substituting
//! a caller-provided value on failure. The substitution is observable: each
//! failure produces exactly one warning record.

use std::fmt::Display;
use std::future::Future;

use crate::log_context;
use crate::logging::{Context, Logger};

/// Run `op`, returning `fallback` if it fails.
///
/// The warning record carries the error message plus any caller context.
pub async fn with_fallback<F, Fut, T, E>(
    logger: &Logger,
    op: F,
    fallback: T,
    context: Option<Context>,
) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match op().await {
        Ok(value) => value,
        Err(error) => {
            let mut merged = log_context! { "error" => error.to_string() };
            if let Some(context) = context {
                merged.extend(context);
            }
            logger.warn("Operation failed, using fallback", Some(merged));
            fallback
        }
    }
}
