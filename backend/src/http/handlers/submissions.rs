//! Stored submissions, plus the code and raw email utilities.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::HandlerResult;
use crate::db::services::{submissions, ServiceError, SubmissionDetail};
use crate::http::dto::{CodeRequest, CodeResponse, SearchQuery, SubmissionListResponse};
use crate::http::extract::CurrentUser;
use crate::http::state::AppState;
use crate::models::SubmissionId;
use crate::services::codes::{generate_alpha_code, FORM_CODE_LEN};
use crate::services::mailer::{DeliveryReceipt, EmailMessage};

/// GET /v1/submissions?search=
pub async fn list_submissions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> HandlerResult<SubmissionListResponse> {
    let listings = submissions::list_submissions(
        state.repository.as_ref(),
        &user.actor,
        query.search.as_deref(),
    )
    .await?;
    let summary = submissions::summarize(&listings);
    Ok(Json(SubmissionListResponse {
        submissions: listings,
        summary,
    }))
}

/// GET /v1/submissions/{id}
pub async fn get_submission(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<SubmissionId>,
) -> HandlerResult<SubmissionDetail> {
    Ok(Json(
        submissions::get_submission(state.repository.as_ref(), &user.actor, id).await?,
    ))
}

/// POST /v1/codes?length=
///
/// Generate a random uppercase code (6 letters unless `length` is given).
pub async fn generate_code(
    _user: CurrentUser,
    Query(request): Query<CodeRequest>,
) -> HandlerResult<CodeResponse> {
    let length = request.length.unwrap_or(FORM_CODE_LEN);
    let code = generate_alpha_code(length).map_err(ServiceError::from)?;
    Ok(Json(CodeResponse { code }))
}

/// POST /v1/emails
pub async fn send_email(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(message): Json<EmailMessage>,
) -> HandlerResult<DeliveryReceipt> {
    let receipt = state
        .mailer
        .send(&message)
        .await
        .map_err(ServiceError::from)?;
    tracing::info!("{} sent email '{}' to {}", user.actor.email, message.subject, message.to);
    Ok(Json(receipt))
}
