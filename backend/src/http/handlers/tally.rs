//! Public endpoints a worker uses to run a tally.
//!
//! A tally starts with `POST /v1/access`, which resolves the code into a
//! draft; every later call mutates that draft.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::{access, catalog, submissions};
use crate::http::dto::{
    AccessRequest, BackResponse, DraftView, InspectionRequest, MissingRequest, SelectBinRequest,
    SubmitResponse, WorkerRequest,
};
use crate::http::error::AppError;
use crate::http::state::AppState;
use crate::models::{BinTypeId, ContaminationType};
use crate::services::drafts::{Draft, DraftId};
use crate::services::tally::{Back, ConfirmationView, TallyError, WorkerInfo};

fn draft_not_found(id: DraftId) -> AppError {
    AppError::NotFound(format!("Draft {} not found", id))
}

fn load_draft(state: &AppState, id: DraftId) -> Result<Draft, AppError> {
    state.drafts.get(id).ok_or_else(|| draft_not_found(id))
}

/// Applies `f` to the draft and returns its updated view.
fn mutate_draft<T>(
    state: &AppState,
    id: DraftId,
    f: impl FnOnce(&mut Draft) -> Result<T, TallyError>,
) -> HandlerResult<DraftView> {
    state
        .drafts
        .update(id, f)
        .ok_or_else(|| draft_not_found(id))??;
    Ok(Json(DraftView::from(&load_draft(state, id)?)))
}

/// POST /v1/access
///
/// Resolve a form id, form code or invitation code and open a draft.
pub async fn open_draft(
    State(state): State<AppState>,
    Json(request): Json<AccessRequest>,
) -> CreatedResult<DraftView> {
    let (grant, site) = access::open_site(state.repository.as_ref(), &request.code).await?;
    tracing::info!(
        "Opened tally of form {} ({} bins)",
        grant.form_id,
        site.total_bins()
    );
    let draft = state.drafts.create(site, grant.access_code);
    created(DraftView::from(&draft))
}

/// GET /v1/drafts/{id}
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> HandlerResult<DraftView> {
    Ok(Json(DraftView::from(&load_draft(&state, id)?)))
}

/// DELETE /v1/drafts/{id}
///
/// Abandon a tally.
pub async fn discard_draft(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> Result<StatusCode, AppError> {
    state.drafts.remove(id).ok_or_else(|| draft_not_found(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/drafts/{id}/worker
pub async fn identify_worker(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
    Json(request): Json<WorkerRequest>,
) -> HandlerResult<DraftView> {
    let worker = WorkerInfo::new(&request.name, request.user_type)?;
    mutate_draft(&state, id, |draft| {
        draft.session.identify_worker(worker).map(|_| ())
    })
}

/// POST /v1/drafts/{id}/select
pub async fn select_bin(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
    Json(request): Json<SelectBinRequest>,
) -> HandlerResult<DraftView> {
    mutate_draft(&state, id, |draft| {
        draft.session.select_bin(&request.bin).map(|_| ())
    })
}

/// POST /v1/drafts/{id}/cancel
pub async fn cancel_selection(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> HandlerResult<DraftView> {
    mutate_draft(&state, id, |draft| {
        draft.session.cancel_selection().map(|_| ())
    })
}

/// POST /v1/drafts/{id}/back
///
/// Going back from the first step leaves the tally and discards the draft.
pub async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> HandlerResult<BackResponse> {
    let back = state
        .drafts
        .update(id, |draft| draft.session.go_back())
        .ok_or_else(|| draft_not_found(id))??;
    match back {
        Back::Leave => {
            state.drafts.remove(id);
            Ok(Json(BackResponse {
                leave: true,
                draft: None,
            }))
        }
        Back::To(_) => Ok(Json(BackResponse {
            leave: false,
            draft: Some(DraftView::from(&load_draft(&state, id)?)),
        })),
    }
}

/// POST /v1/drafts/{id}/inspections
pub async fn record_inspection(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
    Json(request): Json<InspectionRequest>,
) -> HandlerResult<DraftView> {
    let now = Utc::now();
    mutate_draft(&state, id, |draft| {
        draft
            .session
            .record_inspection(&request.bin, &request.input, now)
            .map(|_| ())
    })
}

/// POST /v1/drafts/{id}/missing
pub async fn report_missing(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
    Json(request): Json<MissingRequest>,
) -> HandlerResult<DraftView> {
    let now = Utc::now();
    mutate_draft(&state, id, |draft| {
        draft
            .session
            .report_missing(&request.bins, &request.comment, now)
            .map(|_| ())
    })
}

/// GET /v1/drafts/{id}/bins/{bin_type_id}/contamination-types
///
/// Contamination options for one bin of the draft's site.
pub async fn contamination_options(
    State(state): State<AppState>,
    Path((id, bin_type_id)): Path<(DraftId, BinTypeId)>,
) -> HandlerResult<Vec<ContaminationType>> {
    let draft = load_draft(&state, id)?;
    let site = draft.session.site();
    if !site.bins.iter().any(|bin| bin.bin_type_id == bin_type_id) {
        return Err(AppError::NotFound(format!(
            "Bin type {} is not part of this site",
            bin_type_id
        )));
    }
    let form = state.repository.get_form(site.form_id).await?;
    let options =
        catalog::options_for_bin(state.repository.as_ref(), bin_type_id, form.company_id).await?;
    Ok(Json(options))
}

/// POST /v1/drafts/{id}/review
pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> HandlerResult<ConfirmationView> {
    let view = state
        .drafts
        .update(id, |draft| draft.session.review())
        .ok_or_else(|| draft_not_found(id))??;
    Ok(Json(view))
}

/// POST /v1/drafts/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<DraftId>,
) -> CreatedResult<SubmitResponse> {
    let stored = submissions::submit(state.repository.as_ref(), &state.drafts, id).await?;
    let draft = load_draft(&state, id)?;
    created(SubmitResponse {
        submission_id: stored.id,
        submitted_at: stored.submitted_at,
        draft: DraftView::from(&draft),
    })
}
