//! Errors raised by the service layer.

use thiserror::Error;

use crate::db::repository::RepositoryError;
use crate::services::mailer::MailError;
use crate::services::tally::TallyError;
use crate::services::CodeError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is malformed or breaks a business rule.
    #[error("{0}")]
    Validation(String),

    /// The actor is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid code. Please try again.")]
    InvalidCode,

    #[error(transparent)]
    Tally(#[from] TallyError),

    #[error("Failed to send email: {0}")]
    Mail(#[from] MailError),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }
}

/// Fails with [`ServiceError::Validation`] when `value` is blank.
pub(crate) fn require(value: &str, message: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        Err(ServiceError::validation(message))
    } else {
        Ok(())
    }
}

/// Fails with [`ServiceError::Forbidden`] unless the actor is a super admin.
pub(crate) fn require_super_admin(
    actor: &crate::models::Actor,
    message: &str,
) -> ServiceResult<()> {
    if actor.is_super_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden(message))
    }
}
