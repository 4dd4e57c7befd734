//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic.
//!
//! - [`tally`]: public worker endpoints driving a draft
//! - [`admin`]: sign-in, companies and users
//! - [`catalog`]: bin types and contamination types
//! - [`forms`]: forms and their invitations
//! - [`submissions`]: stored tallies, code generation and raw email

pub mod admin;
pub mod catalog;
pub mod forms;
pub mod submissions;
pub mod tally;

use axum::{extract::State, http::StatusCode, Json};

use super::dto::HealthResponse;
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

pub(crate) fn created<T>(value: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}
