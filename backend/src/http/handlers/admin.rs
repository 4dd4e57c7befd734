//! Administrator sign-in, companies and users.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{created, CreatedResult, HandlerResult};
use crate::db::services::{auth, companies, users};
use crate::http::dto::{
    CompanyAssignment, CreateUserRequest, LoginRequest, LoginResponse, RoleRequest,
};
use crate::http::error::AppError;
use crate::http::extract::CurrentUser;
use crate::http::state::AppState;
use crate::models::{
    Actor, Company, CompanyId, CompanyInput, CompanyWithStats, User, UserId, UserWithCompany,
};

// =============================================================================
// Auth
// =============================================================================

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<LoginResponse> {
    let session = auth::sign_in(
        state.repository.as_ref(),
        &state.sessions,
        &request.email,
        &request.password,
    )
    .await?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: session.actor,
    }))
}

/// POST /v1/auth/logout
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> StatusCode {
    auth::sign_out(&state.sessions, &user.token);
    StatusCode::NO_CONTENT
}

/// GET /v1/auth/me
pub async fn me(user: CurrentUser) -> HandlerResult<Actor> {
    Ok(Json(user.actor))
}

// =============================================================================
// Companies
// =============================================================================

/// GET /v1/companies
pub async fn list_companies(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Vec<CompanyWithStats>> {
    let companies = companies::list_companies(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
    )
    .await?;
    Ok(Json(companies))
}

/// GET /v1/companies/{id}
pub async fn get_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CompanyId>,
) -> HandlerResult<Company> {
    let company = companies::get_company(state.repository.as_ref(), &user.actor, id).await?;
    Ok(Json(company))
}

/// POST /v1/companies
pub async fn create_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CompanyInput>,
) -> CreatedResult<Company> {
    let company = companies::create_company(state.repository.as_ref(), &user.actor, &input).await?;
    created(company)
}

/// PUT /v1/companies/{id}
pub async fn update_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CompanyId>,
    Json(input): Json<CompanyInput>,
) -> HandlerResult<Company> {
    let company = companies::update_company(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
        id,
        &input,
    )
    .await?;
    Ok(Json(company))
}

/// DELETE /v1/companies/{id}
pub async fn delete_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<CompanyId>,
) -> Result<StatusCode, AppError> {
    companies::delete_company(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
        id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users
// =============================================================================

/// GET /v1/users
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Vec<UserWithCompany>> {
    Ok(Json(
        users::list_users(state.repository.as_ref(), &user.actor).await?,
    ))
}

/// GET /v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
) -> HandlerResult<User> {
    Ok(Json(
        users::get_user(state.repository.as_ref(), &user.actor, id).await?,
    ))
}

/// POST /v1/users
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> CreatedResult<User> {
    let created_user = users::create_user(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
        &users::CreateUser {
            email: request.email,
            password: request.password,
            name: request.name,
            role: request.role,
            company_id: request.company_id,
        },
    )
    .await?;
    created(created_user)
}

/// PUT /v1/users/{id}/role
///
/// Existing sessions of the user are revoked so the new role takes effect.
pub async fn update_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
    Json(request): Json<RoleRequest>,
) -> HandlerResult<User> {
    let updated = users::update_role(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
        id,
        request.role,
    )
    .await?;
    state.sessions.revoke_user(id);
    Ok(Json(updated))
}

/// PUT /v1/users/{id}/company
pub async fn assign_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
    Json(request): Json<CompanyAssignment>,
) -> HandlerResult<User> {
    let updated = users::assign_company(
        state.repository.as_ref(),
        &user.actor,
        &state.config.policy,
        id,
        request.company_id,
    )
    .await?;
    state.sessions.revoke_user(id);
    Ok(Json(updated))
}

/// DELETE /v1/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    users::delete_user(state.repository.as_ref(), &user.actor, id).await?;
    state.sessions.revoke_user(id);
    Ok(StatusCode::NO_CONTENT)
}
