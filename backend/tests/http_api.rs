//! End-to-end tests of the HTTP API against the in-memory repository.
#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bin_tally::db::repository::FullRepository;
use bin_tally::http::{create_router, AppState};

use support::{world, World, ROOT_EMAIL, ROOT_PASSWORD};

async fn app() -> (Router, World) {
    let world = world().await;
    let repo: Arc<dyn FullRepository> = Arc::new(world.repo.clone());
    (create_router(AppState::with_repository(repo)), world)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": ROOT_EMAIL, "password": ROOT_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app().await;
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_storage_failure_is_a_server_error() {
    let (app, world) = app().await;
    let token = login(&app).await;
    world.repo.set_healthy(false);

    let (status, body) = call(&app, Method::GET, "/v1/forms", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "REPOSITORY_ERROR");
    assert_eq!(body["message"], "A storage error occurred");
    assert!(body["details"].as_str().unwrap().contains("unhealthy"));

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");

    world.repo.set_healthy(true);
    let (status, _) = call(&app, Method::GET, "/v1/forms", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let (app, _) = app().await;

    let (status, body) = call(&app, Method::GET, "/v1/forms", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = call(&app, Method::GET, "/v1/forms", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failure_and_logout() {
    let (app, _) = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": ROOT_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let token = login(&app).await;
    let (status, me) = call(&app, Method::GET, "/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ROOT_EMAIL);
    assert_eq!(me["role"], "super_admin");

    let (status, _) = call(&app, Method::POST, "/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, "/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_bodies() {
    let (app, world) = app().await;
    let token = login(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/bin-types",
        Some(&token),
        Some(json!({ "name": "General Waste", "bin_size": "240", "bin_uom": "L" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let missing = format!("/v1/forms/{}", uuid::Uuid::new_v4());
    let (status, body) = call(&app, Method::GET, &missing, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = call(
        &app,
        Method::POST,
        "/v1/access",
        None,
        Some(json!({ "code": "NOPE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CODE");
    assert_eq!(body["message"], "Invalid code. Please try again.");

    let general = format!("/v1/bin-types/{}", world.general.id);
    let (status, body) = call(&app, Method::GET, &general, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "General Waste");
}

#[tokio::test]
async fn test_tally_flow_from_access_to_submission() {
    let (app, world) = app().await;
    let token = login(&app).await;

    let (status, form) = call(
        &app,
        Method::POST,
        "/v1/forms",
        Some(&token),
        Some(json!({
            "title": "Harbour Plaza",
            "location": "1 Quay St",
            "area": "Loading dock",
            "company_id": world.acme.id,
            "bins": [
                { "bin_type_id": world.general.id, "quantity": 2 },
                { "bin_type_id": world.recycling.id, "quantity": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = form["form"]["unique_code"].as_str().unwrap().to_lowercase();

    let (status, draft) = call(
        &app,
        Method::POST,
        "/v1/access",
        None,
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["step"], "identifying_worker");
    let draft_id = draft["id"].as_str().unwrap().to_string();
    let bins: Vec<String> = draft["site"]["bins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(bins.len(), 3);

    let base = format!("/v1/drafts/{}", draft_id);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("{}/inspections", base),
        None,
        Some(json!({ "bin": bins[0], "fullness": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "TALLY_ERROR");

    let (status, draft) = call(
        &app,
        Method::PUT,
        &format!("{}/worker", base),
        None,
        Some(json!({ "name": "Sam Lee", "userType": "Cleaner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["step"], "selecting_bin");

    let (status, draft) = call(
        &app,
        Method::POST,
        &format!("{}/inspections", base),
        None,
        Some(json!({ "bin": bins[0], "fullness": 75, "contaminated": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["progress"], "1 of 3 bins accounted for");

    let (status, draft) = call(
        &app,
        Method::POST,
        &format!("{}/missing", base),
        None,
        Some(json!({ "bins": [bins[1]], "comment": "Removed for repairs" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["progress"], "2 of 3 bins accounted for");

    let (status, review) = call(&app, Method::POST, &format!("{}/review", base), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["tables"]["uninspected"].as_array().unwrap().len(), 1);

    let (status, submitted) =
        call(&app, Method::POST, &format!("{}/submit", base), None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted["draft"]["step"], "submitted");
    let submission_id = submitted["submission_id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::POST, &format!("{}/submit", base), None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TALLY_ERROR");

    let (status, listing) = call(&app, Method::GET, "/v1/submissions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["summary"]["total_submissions"], 1);
    assert_eq!(listing["summary"]["total_inspected"], 1);
    assert_eq!(listing["summary"]["total_missing"], 1);

    let (status, detail) = call(
        &app,
        Method::GET,
        &format!("/v1/submissions/{}", submission_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["counts"]["uninspected"], 1);
    assert_eq!(detail["form_title"], "Harbour Plaza");
}

#[tokio::test]
async fn test_generate_code() {
    let (app, _) = app().await;
    let token = login(&app).await;

    let (status, body) = call(&app, Method::POST, "/v1/codes?length=8", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_uppercase()));
}
