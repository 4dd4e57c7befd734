//! Form and invitation endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::{forms, invitations};
use crate::http::dto::{FormListQuery, FormRequest, InvitationRequest};
use crate::http::error::AppError;
use crate::http::extract::CurrentUser;
use crate::http::state::AppState;
use crate::models::{FormDetails, FormId, FormSummary, Invitation, InvitationId};
use crate::services::mailer::DeliveryReceipt;

/// GET /v1/forms?company_id=&search=
pub async fn list_forms(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<FormListQuery>,
) -> HandlerResult<Vec<FormSummary>> {
    let forms = forms::list_forms(
        state.repository.as_ref(),
        &user.actor,
        query.company_id,
        query.search.as_deref(),
    )
    .await?;
    Ok(Json(forms))
}

/// GET /v1/forms/{id}
pub async fn get_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<FormId>,
) -> HandlerResult<FormDetails> {
    Ok(Json(
        forms::get_form(state.repository.as_ref(), &user.actor, id).await?,
    ))
}

/// POST /v1/forms
pub async fn create_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<FormRequest>,
) -> CreatedResult<FormDetails> {
    created(
        forms::create_form(
            state.repository.as_ref(),
            &user.actor,
            &request.form,
            &request.bins,
        )
        .await?,
    )
}

/// PUT /v1/forms/{id}
pub async fn update_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<FormId>,
    Json(request): Json<FormRequest>,
) -> HandlerResult<FormDetails> {
    let details = forms::update_form(
        state.repository.as_ref(),
        &user.actor,
        id,
        &request.form,
        &request.bins,
    )
    .await?;
    Ok(Json(details))
}

/// DELETE /v1/forms/{id}
pub async fn delete_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<FormId>,
) -> Result<StatusCode, AppError> {
    forms::delete_form(state.repository.as_ref(), &user.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/forms/{id}/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<FormId>,
) -> HandlerResult<Vec<Invitation>> {
    Ok(Json(
        invitations::list_invitations(state.repository.as_ref(), &user.actor, id).await?,
    ))
}

/// POST /v1/forms/{id}/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<FormId>,
    Json(request): Json<InvitationRequest>,
) -> CreatedResult<Invitation> {
    created(
        invitations::create_invitation(
            state.repository.as_ref(),
            &user.actor,
            id,
            &request.email,
        )
        .await?,
    )
}

/// DELETE /v1/invitations/{id}
pub async fn delete_invitation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<InvitationId>,
) -> Result<StatusCode, AppError> {
    invitations::delete_invitation(state.repository.as_ref(), &user.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/invitations/{id}/send
pub async fn send_invitation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<InvitationId>,
) -> HandlerResult<DeliveryReceipt> {
    let receipt = invitations::send_invitation(
        state.repository.as_ref(),
        state.mailer.as_ref(),
        &user.actor,
        id,
    )
    .await?;
    Ok(Json(receipt))
}
