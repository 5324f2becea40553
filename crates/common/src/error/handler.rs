//! Central error normalization
//!
//! Every failure crossing an operation boundary funnels through one
//! [`ErrorHandler`], which classifies it, logs it exactly once, and yields a
//! typed [`AppError`]. User-facing messages come from
//! [`ErrorHandler::user_message`]; production never exposes raw foreign
//! errors.

use std::future::Future;
use std::sync::Arc;

use crate::config::Environment;
use crate::logging::{Context, ErrorDetails, Logger};

use super::{AppError, Failure};

/// Message shown for anything we cannot safely explain to the user.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Normalizes arbitrary failures into the [`AppError`] taxonomy.
#[derive(Clone)]
pub struct ErrorHandler {
    logger: Arc<Logger>,
    environment: Environment,
}

impl ErrorHandler {
    pub fn new(logger: Arc<Logger>) -> Self {
        let environment = logger.environment();
        Self { logger, environment }
    }

    /// Classify a failure, log it, and return the typed error.
    ///
    /// [`Failure::App`] values pass through unchanged; everything else is
    /// wrapped as [`AppError::Unexpected`]. Exactly one record is written per
    /// call, at error level, merging the error's own context with the
    /// caller-supplied one.
    pub fn handle(&self, failure: Failure, context: Option<Context>) -> AppError {
        match failure {
            Failure::App(error) => {
                let merged = merge_context(error.context().cloned(), context);
                self.logger.error(
                    error.to_string(),
                    Some(ErrorDetails::from(&error)),
                    merged,
                );
                error
            }
            Failure::Foreign(foreign) => {
                let details = ErrorDetails::from_error(foreign.as_ref());
                self.logger.error("Unhandled error", Some(details), context);
                AppError::unexpected(foreign.to_string())
            }
            Failure::Message(message) => {
                self.logger.error("Unknown error occurred", None, context);
                AppError::unexpected(message)
            }
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Validation errors enumerate their failed rules; other typed errors use
    /// their own message. Unclassified failures get the generic message in
    /// production, the raw message elsewhere; opaque messages always get the
    /// generic one.
    pub fn user_message(&self, failure: &Failure) -> String {
        match failure {
            Failure::App(AppError::Validation { errors, .. }) if !errors.is_empty() => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Failure::App(error) => error.to_string(),
            Failure::Foreign(foreign) => {
                if self.environment.is_production() {
                    GENERIC_ERROR_MESSAGE.to_string()
                } else {
                    foreign.to_string()
                }
            }
            Failure::Message(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether a failure is an anticipated condition. Only typed operational
    /// errors qualify.
    pub fn is_operational(&self, failure: &Failure) -> bool {
        match failure {
            Failure::App(error) => error.is_operational(),
            Failure::Foreign(_) | Failure::Message(_) => false,
        }
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

fn merge_context(own: Option<Context>, extra: Option<Context>) -> Option<Context> {
    match (own, extra) {
        (Some(mut own), Some(extra)) => {
            own.extend(extra);
            Some(own)
        }
        (own, extra) => own.or(extra),
    }
}

/// Run an operation, normalizing any failure through the handler.
///
/// The context is attached to the log record and merged into the resulting
/// error.
pub async fn with_error_handling<F, Fut, T>(
    handler: &ErrorHandler,
    context: Option<Context>,
    op: F,
) -> Result<T, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(failure) => {
            let error = handler.handle(failure, context.clone());
            match context {
                Some(context) => Err(error.with_context(context)),
                None => Err(error),
            }
        }
    }
}
