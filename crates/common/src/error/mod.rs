//! Application error taxonomy
//!
//! A closed set of typed errors carrying status-code semantics, an
//! operational flag, and structured context. Operational errors are expected
//! conditions (bad input, missing resource, transient unavailability) and are
//! safe to render to end users; non-operational errors are defects or
//! infrastructure faults and must never leak internals in production.
//!
//! [`Failure`] models the "anything can go wrong" boundary: a value is either
//! already classified ([`AppError`]), a foreign `std::error::Error`, or an
//! opaque message. It is resolved exactly once, at
//! [`ErrorHandler::handle`](crate::error::ErrorHandler::handle).

mod handler;

use std::fmt;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub use handler::{with_error_handling, ErrorHandler, GENERIC_ERROR_MESSAGE};

use crate::logging::{Context, ErrorDetails};

/// Boxed foreign error carried inside [`Failure`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single failed validation rule, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Typed application error.
///
/// Every variant except [`AppError::Unexpected`] is operational. Status codes
/// are semantic, not necessarily transport-bound.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("{message}")]
    Authentication { message: String, context: Option<Context> },

    #[error("{message}")]
    Authorization { message: String, context: Option<Context> },

    #[error("{message}")]
    Validation { message: String, errors: Vec<FieldError>, context: Option<Context> },

    #[error("{resource} not found")]
    NotFound { resource: String, context: Option<Context> },

    #[error("{message}")]
    Conflict { message: String, context: Option<Context> },

    #[error("{message}")]
    RateLimit { message: String, context: Option<Context> },

    #[error("{message}")]
    Database { message: String, context: Option<Context> },

    #[error("{message}")]
    ExternalService { service: String, message: String, context: Option<Context> },

    /// Wrapper for unclassified failures. Non-operational.
    #[error("{message}")]
    Unexpected { message: String, context: Option<Context> },
}

impl AppError {
    pub fn authentication(message: impl Into<String>) -> Self {
        AppError::Authentication { message: message.into(), context: None }
    }

    pub fn authentication_required() -> Self {
        Self::authentication("Authentication required")
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        AppError::Authorization { message: message.into(), context: None }
    }

    pub fn access_denied() -> Self {
        Self::authorization("Access denied")
    }

    /// Validation failure carrying the failed rules in declaration order.
    ///
    /// The rules are also mirrored into the context so log records show them.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        let mut context = Context::new();
        context.insert("errors".to_string(), json!(errors));
        AppError::Validation {
            message: "Validation failed".to_string(),
            errors,
            context: Some(context),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound { resource: resource.into(), context: None }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict { message: message.into(), context: None }
    }

    pub fn rate_limit() -> Self {
        AppError::RateLimit { message: "Too many requests".to_string(), context: None }
    }

    pub fn database(message: impl Into<String>) -> Self {
        AppError::Database { message: message.into(), context: None }
    }

    /// External dependency failure; the context is tagged with the service
    /// name so records stay attributable after aggregation.
    pub fn external_service(service: impl Into<String>) -> Self {
        let service = service.into();
        Self::external_service_with_message(service.clone(), format!("{service} service unavailable"))
    }

    pub fn external_service_with_message(
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let service = service.into();
        let mut context = Context::new();
        context.insert("service".to_string(), json!(service.clone()));
        AppError::ExternalService { service, message: message.into(), context: Some(context) }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        AppError::Unexpected { message: message.into(), context: None }
    }

    /// Merge extra context into this error, keeping existing entries on key
    /// collision.
    pub fn with_context(mut self, extra: Context) -> Self {
        let slot = self.context_mut();
        let mut merged = extra;
        if let Some(existing) = slot.take() {
            merged.extend(existing);
        }
        *slot = Some(merged);
        self
    }

    fn context_mut(&mut self) -> &mut Option<Context> {
        match self {
            AppError::Authentication { context, .. }
            | AppError::Authorization { context, .. }
            | AppError::Validation { context, .. }
            | AppError::NotFound { context, .. }
            | AppError::Conflict { context, .. }
            | AppError::RateLimit { context, .. }
            | AppError::Database { context, .. }
            | AppError::ExternalService { context, .. }
            | AppError::Unexpected { context, .. } => context,
        }
    }

    pub fn context(&self) -> Option<&Context> {
        match self {
            AppError::Authentication { context, .. }
            | AppError::Authorization { context, .. }
            | AppError::Validation { context, .. }
            | AppError::NotFound { context, .. }
            | AppError::Conflict { context, .. }
            | AppError::RateLimit { context, .. }
            | AppError::Database { context, .. }
            | AppError::ExternalService { context, .. }
            | AppError::Unexpected { context, .. } => context.as_ref(),
        }
    }

    /// Semantic status code from the taxonomy table.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Authentication { .. } => 401,
            AppError::Authorization { .. } => 403,
            AppError::Validation { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::RateLimit { .. } => 429,
            AppError::Database { .. } => 500,
            AppError::ExternalService { .. } => 502,
            AppError::Unexpected { .. } => 500,
        }
    }

    /// Whether this error is an anticipated condition rather than a defect.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Unexpected { .. })
    }

    /// Stable error-class name used in log records.
    pub fn name(&self) -> &'static str {
        match self {
            AppError::Authentication { .. } => "AuthenticationError",
            AppError::Authorization { .. } => "AuthorizationError",
            AppError::Validation { .. } => "ValidationError",
            AppError::NotFound { .. } => "NotFoundError",
            AppError::Conflict { .. } => "ConflictError",
            AppError::RateLimit { .. } => "RateLimitError",
            AppError::Database { .. } => "DatabaseError",
            AppError::ExternalService { .. } => "ExternalServiceError",
            AppError::Unexpected { .. } => "AppError",
        }
    }
}

impl From<&AppError> for ErrorDetails {
    fn from(error: &AppError) -> Self {
        ErrorDetails::new(error.name(), error.to_string())
    }
}

/// An unclassified failure awaiting normalization.
#[derive(Debug)]
pub enum Failure {
    /// Already part of the taxonomy; [`ErrorHandler::handle`] returns it
    /// unchanged.
    App(AppError),
    /// A foreign `std::error::Error`.
    Foreign(BoxedError),
    /// Anything else, stringified at the point it was caught.
    Message(String),
}

impl Failure {
    pub fn foreign(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Failure::Foreign(Box::new(error))
    }

    pub fn message(value: impl fmt::Display) -> Self {
        Failure::Message(value.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::App(error) => write!(f, "{error}"),
            Failure::Foreign(error) => write!(f, "{error}"),
            Failure::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::App(error) => Some(error),
            Failure::Foreign(error) => Some(error.as_ref()),
            Failure::Message(_) => None,
        }
    }
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Failure::App(error)
    }
}

impl From<BoxedError> for Failure {
    fn from(error: BoxedError) -> Self {
        Failure::Foreign(error)
    }
}
