//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::models::Actor;

/// The administrator behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub token: String,
    pub actor: Actor,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        let session = state
            .sessions
            .authenticate(token)
            .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".to_string()))?;
        Ok(CurrentUser {
            token: session.token,
            actor: session.actor,
        })
    }
}
