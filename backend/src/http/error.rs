//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::db::services::ServiceError;
use crate::services::tally::TallyError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Missing or invalid bearer token
    Unauthorized(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
    /// Service layer error
    Service(ServiceError),
}

fn repository_response(err: &RepositoryError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message)),
        RepositoryError::ValidationError { .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", message),
        ),
        RepositoryError::ConflictError { .. } => {
            (StatusCode::CONFLICT, ApiError::new("CONFLICT", message))
        }
        _ => {
            tracing::error!("Repository failure: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", "A storage error occurred").with_details(message),
            )
        }
    }
}

fn tally_response(err: &TallyError) -> (StatusCode, ApiError) {
    let status = match err {
        TallyError::AlreadySubmitted => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, ApiError::new("TALLY_ERROR", err.to_string()))
}

fn service_response(err: &ServiceError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        ServiceError::Validation(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", message),
        ),
        ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", message)),
        ServiceError::Conflict(_) => (StatusCode::CONFLICT, ApiError::new("CONFLICT", message)),
        ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message)),
        ServiceError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            ApiError::new("INVALID_CREDENTIALS", message),
        ),
        ServiceError::InvalidCode => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_CODE", message),
        ),
        ServiceError::Code(_) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", message)),
        ServiceError::Tally(e) => tally_response(e),
        ServiceError::Mail(e) => {
            tracing::error!("Email delivery failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("MAIL_ERROR", message),
            )
        }
        ServiceError::Repository(e) => repository_response(e),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => repository_response(&e),
            AppError::Service(e) => service_response(&e),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<TallyError> for AppError {
    fn from(err: TallyError) -> Self {
        AppError::Service(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
