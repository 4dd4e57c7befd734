//! Bin type and contamination type endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::catalog;
use crate::http::error::AppError;
use crate::http::extract::CurrentUser;
use crate::http::state::AppState;
use crate::models::{
    BinType, BinTypeId, BinTypeInput, ContaminationType, ContaminationTypeId,
    ContaminationTypeInput,
};

/// GET /v1/bin-types
pub async fn list_bin_types(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> HandlerResult<Vec<BinType>> {
    Ok(Json(catalog::list_bin_types(state.repository.as_ref()).await?))
}

/// GET /v1/bin-types/{id}
pub async fn get_bin_type(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<BinTypeId>,
) -> HandlerResult<BinType> {
    Ok(Json(state.repository.get_bin_type(id).await?))
}

/// POST /v1/bin-types
pub async fn create_bin_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<BinTypeInput>,
) -> CreatedResult<BinType> {
    created(catalog::create_bin_type(state.repository.as_ref(), &user.actor, &input).await?)
}

/// PUT /v1/bin-types/{id}
pub async fn update_bin_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BinTypeId>,
    Json(input): Json<BinTypeInput>,
) -> HandlerResult<BinType> {
    Ok(Json(
        catalog::update_bin_type(state.repository.as_ref(), &user.actor, id, &input).await?,
    ))
}

/// DELETE /v1/bin-types/{id}
pub async fn delete_bin_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<BinTypeId>,
) -> Result<StatusCode, AppError> {
    catalog::delete_bin_type(state.repository.as_ref(), &user.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/contamination-types
pub async fn list_contamination_types(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Vec<ContaminationType>> {
    Ok(Json(
        catalog::list_contamination_types(state.repository.as_ref(), &user.actor).await?,
    ))
}

/// POST /v1/contamination-types
pub async fn create_contamination_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ContaminationTypeInput>,
) -> CreatedResult<ContaminationType> {
    created(
        catalog::create_contamination_type(state.repository.as_ref(), &user.actor, &input).await?,
    )
}

/// PUT /v1/contamination-types/{id}
pub async fn update_contamination_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContaminationTypeId>,
    Json(input): Json<ContaminationTypeInput>,
) -> HandlerResult<ContaminationType> {
    Ok(Json(
        catalog::update_contamination_type(state.repository.as_ref(), &user.actor, id, &input)
            .await?,
    ))
}

/// DELETE /v1/contamination-types/{id}
pub async fn delete_contamination_type(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ContaminationTypeId>,
) -> Result<StatusCode, AppError> {
    catalog::delete_contamination_type(state.repository.as_ref(), &user.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
