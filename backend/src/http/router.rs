//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, admin, catalog, forms, submissions, tally};
use super::state::AppState;

/// Routes used by workers running a tally. No authentication.
fn worker_routes() -> Router<AppState> {
    Router::new()
        .route("/access", post(tally::open_draft))
        .route(
            "/drafts/{id}",
            get(tally::get_draft).delete(tally::discard_draft),
        )
        .route("/drafts/{id}/worker", put(tally::identify_worker))
        .route("/drafts/{id}/select", post(tally::select_bin))
        .route("/drafts/{id}/cancel", post(tally::cancel_selection))
        .route("/drafts/{id}/back", post(tally::go_back))
        .route("/drafts/{id}/inspections", post(tally::record_inspection))
        .route("/drafts/{id}/missing", post(tally::report_missing))
        .route(
            "/drafts/{id}/bins/{bin_type_id}/contamination-types",
            get(tally::contamination_options),
        )
        .route("/drafts/{id}/review", post(tally::review))
        .route("/drafts/{id}/submit", post(tally::submit))
}

/// Routes used by administrators. Every handler requires a bearer token.
fn admin_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/login", post(admin::login))
        .route("/auth/logout", post(admin::logout))
        .route("/auth/me", get(admin::me))
        // Companies
        .route(
            "/companies",
            get(admin::list_companies).post(admin::create_company),
        )
        .route(
            "/companies/{id}",
            get(admin::get_company)
                .put(admin::update_company)
                .delete(admin::delete_company),
        )
        // Users
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user).delete(admin::delete_user),
        )
        .route("/users/{id}/role", put(admin::update_role))
        .route("/users/{id}/company", put(admin::assign_company))
        // Catalogues
        .route(
            "/bin-types",
            get(catalog::list_bin_types).post(catalog::create_bin_type),
        )
        .route(
            "/bin-types/{id}",
            get(catalog::get_bin_type)
                .put(catalog::update_bin_type)
                .delete(catalog::delete_bin_type),
        )
        .route(
            "/contamination-types",
            get(catalog::list_contamination_types).post(catalog::create_contamination_type),
        )
        .route(
            "/contamination-types/{id}",
            put(catalog::update_contamination_type).delete(catalog::delete_contamination_type),
        )
        // Forms and invitations
        .route("/forms", get(forms::list_forms).post(forms::create_form))
        .route(
            "/forms/{id}",
            get(forms::get_form)
                .put(forms::update_form)
                .delete(forms::delete_form),
        )
        .route(
            "/forms/{id}/invitations",
            get(forms::list_invitations).post(forms::create_invitation),
        )
        .route(
            "/invitations/{id}",
            axum::routing::delete(forms::delete_invitation),
        )
        .route("/invitations/{id}/send", post(forms::send_invitation))
        // Submissions and utilities
        .route("/submissions", get(submissions::list_submissions))
        .route("/submissions/{id}", get(submissions::get_submission))
        .route("/codes", post(submissions::generate_code))
        .route("/emails", post(submissions::send_email))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = worker_routes().merge(admin_routes());

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
