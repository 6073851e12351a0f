//! Identity and relay endpoints backed by mock upstreams.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_api::{build_router, ApiKeyAccessControl, AppState, ServerConfig};
use portal_clients::{FirebaseIdentityClient, FormRelayClient, IdentityConfig};
use portal_core::SubmissionLimits;
use portal_db::{InMemoryNoteRepository, InMemoryObjectStore};

fn base_state() -> AppState {
    AppState::new(
        Arc::new(InMemoryNoteRepository::new()),
        Arc::new(InMemoryObjectStore::new()),
        Arc::new(ApiKeyAccessControl::new(Vec::<String>::new())),
        SubmissionLimits::default(),
    )
}

fn identity_router(server: &MockServer) -> Router {
    let mut config = IdentityConfig::new("test-key");
    config.base_url = server.uri();
    let client = FirebaseIdentityClient::new(config).unwrap();
    build_router(
        base_state().with_identity(Arc::new(client)),
        &ServerConfig::default(),
    )
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_sign_in_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-7",
            "email": "student@example.edu",
            "idToken": "token-7",
            "refreshToken": "refresh-7"
        })))
        .mount(&server)
        .await;

    let router = identity_router(&server);
    let (status, body) = post_json(
        &router,
        "/api/v1/auth/sign-in",
        json!({ "email": " student@example.edu ", "password": "secret1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], "uid-7");
    assert_eq!(body["id_token"], "token-7");
}

#[tokio::test]
async fn test_provider_errors_map_to_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_PASSWORD" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "EMAIL_EXISTS" }
        })))
        .mount(&server)
        .await;

    let router = identity_router(&server);

    let (status, body) = post_json(
        &router,
        "/api/v1/auth/sign-in",
        json!({ "email": "student@example.edu", "password": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Incorrect password. Please try again.");

    let (status, body) = post_json(
        &router,
        "/api/v1/auth/sign-up",
        json!({ "email": "taken@example.edu", "password": "longenough" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "An account with this email already exists.");
}

#[tokio::test]
async fn test_password_reset_and_sign_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:sendOobCode"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "email": "student@example.edu" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = identity_router(&server);
    let (status, body) = post_json(
        &router,
        "/api/v1/auth/password-reset",
        json!({ "email": "student@example.edu" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/auth/sign-out")
                .header(header::AUTHORIZATION, "Bearer token-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_relay_forwards_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relay"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "ok" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let relay = FormRelayClient::new(format!("{}/relay", server.uri())).unwrap();
    let router = build_router(base_state().with_relay(relay), &ServerConfig::default());

    let (status, body) = post_json(
        &router,
        "/api/v1/relay",
        json!({
            "type": "notes_request",
            "tier": "free",
            "title": "DBMS notes",
            "description": "Looking for normalization notes",
            "subject": "DBMS",
            "name": "Ravi",
            "email": "ravi@example.edu",
            "timestamp": "2026-10-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_relay_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relay"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let relay = FormRelayClient::new(format!("{}/relay", server.uri())).unwrap();
    let router = build_router(base_state().with_relay(relay), &ServerConfig::default());

    let (status, body) = post_json(
        &router,
        "/api/v1/relay",
        json!({
            "type": "contact",
            "tier": "free",
            "title": "Hello",
            "description": "Question about uploads",
            "subject": "General",
            "name": "Ravi",
            "email": "ravi@example.edu",
            "timestamp": "2026-10-01T10:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["retryable"], true);
}
