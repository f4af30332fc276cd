//! Typed errors. Rendering to HTTP is owned by the classifier (see `classify`), not by the errors.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid identifier in resource {resource}: '{identifier}'")]
    InvalidIdentifier { resource: String, identifier: String },
    #[error("duplicate resource name: {0}")]
    DuplicateName(String),
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("catalog load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// One offending field of a uniqueness failure, with the value that collided.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateField {
    pub field: String,
    pub value: String,
}

/// One invalid field of a validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Failure kinds produced by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate entry on {}", fields_of(.0))]
    UniqueViolation(Vec<DuplicateField>),
    #[error("validation failed on {}", violated_fields(.0))]
    Validation(Vec<FieldViolation>),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("backend: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

fn fields_of(fields: &[DuplicateField]) -> String {
    fields.iter().map(|f| f.field.as_str()).collect::<Vec<_>>().join(", ")
}

fn violated_fields(fields: &[FieldViolation]) -> String {
    fields.iter().map(|f| f.field.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("route not found: {0}")]
    RouteNotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A failure that carries its own HTTP mapping.
    #[error("{message}")]
    Declared {
        status: StatusCode,
        code: String,
        message: String,
    },
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn declared(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Declared {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Status the failure declares for itself, if any.
    pub fn declared_status(&self) -> Option<StatusCode> {
        match self {
            AppError::NotFound(_) | AppError::RouteNotFound(_) => Some(StatusCode::NOT_FOUND),
            AppError::BadRequest(_) => Some(StatusCode::BAD_REQUEST),
            AppError::Declared { status, .. } => Some(*status),
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => None,
        }
    }

    /// Error code the failure declares for itself, if any.
    pub fn declared_code(&self) -> Option<&str> {
        match self {
            AppError::NotFound(_) => Some("NOT_FOUND"),
            AppError::RouteNotFound(_) => Some("ROUTE_NOT_FOUND"),
            AppError::BadRequest(_) => Some("BAD_REQUEST"),
            AppError::Declared { code, .. } => Some(code),
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => None,
        }
    }

    /// Message safe to show to the caller. Server-side causes stay in the log.
    pub fn public_message(&self) -> Option<String> {
        match self {
            AppError::NotFound(what) => Some(format!("{} not found", what)),
            AppError::RouteNotFound(_) => Some("Route not found".into()),
            AppError::BadRequest(msg) => Some(msg.clone()),
            AppError::Declared { message, .. } => Some(message.clone()),
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => None,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::declared(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                rejection.body_text(),
            ),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::declared(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                rejection.body_text(),
            ),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

/// A failure waiting to be classified and rendered by the envelope middleware.
#[derive(Clone, Debug)]
pub struct PendingFailure(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self
            .declared_status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = status.into_response();
        res.extensions_mut().insert(PendingFailure(Arc::new(self)));
        res
    }
}
