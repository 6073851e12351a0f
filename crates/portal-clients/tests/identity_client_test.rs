//! Identity client against a mock Identity Toolkit server.

use portal_clients::{FirebaseIdentityClient, IdentityConfig};
use portal_core::{AuthErrorKind, IdentityProvider};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FirebaseIdentityClient {
    let mut config = IdentityConfig::new("test-key");
    config.base_url = server.uri();
    config.timeout_seconds = 5;
    FirebaseIdentityClient::new(config).expect("client builds")
}

fn provider_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(serde_json::json!({
        "error": {
            "code": 400,
            "message": message,
            "errors": [{ "message": message, "domain": "global", "reason": "invalid" }]
        }
    }))
}

#[tokio::test]
async fn test_sign_in_returns_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "email": "student@example.edu",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "localId": "uid-123",
            "email": "student@example.edu",
            "idToken": "id-token",
            "refreshToken": "refresh-token",
            "expiresIn": "3600",
            "registered": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server)
        .sign_in("student@example.edu", "hunter22")
        .await
        .unwrap();

    assert_eq!(user.uid, "uid-123");
    assert_eq!(user.id_token, "id-token");
    assert_eq!(user.refresh_token.as_deref(), Some("refresh-token"));
}

#[tokio::test]
async fn test_wrong_password_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(provider_error("INVALID_PASSWORD"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .sign_in("student@example.edu", "nope")
        .await
        .unwrap_err();

    assert_eq!(err.kind, AuthErrorKind::WrongPassword);
    assert_eq!(err.user_message(), "Incorrect password. Please try again.");
}

#[tokio::test]
async fn test_sign_up_duplicate_and_weak_password() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .and(body_partial_json(serde_json::json!({ "email": "taken@example.edu" })))
        .respond_with(provider_error("EMAIL_EXISTS"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts:signUp"))
        .and(body_partial_json(serde_json::json!({ "email": "new@example.edu" })))
        .respond_with(provider_error(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let taken = client.sign_up("taken@example.edu", "longenough").await.unwrap_err();
    assert_eq!(taken.kind, AuthErrorKind::EmailAlreadyInUse);

    let weak = client.sign_up("new@example.edu", "abc").await.unwrap_err();
    assert_eq!(weak.kind, AuthErrorKind::WeakPassword);
}

#[tokio::test]
async fn test_password_reset_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts:sendOobCode"))
        .and(body_partial_json(serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": "student@example.edu"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "email": "student@example.edu" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .send_password_reset("student@example.edu")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_email_on_reset() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts:sendOobCode"))
        .respond_with(provider_error("EMAIL_NOT_FOUND"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .send_password_reset("ghost@example.edu")
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::UserNotFound);
}

#[tokio::test]
async fn test_unreachable_provider_is_network_error() {
    let mut config = IdentityConfig::new("test-key");
    config.base_url = "http://127.0.0.1:1".to_string();
    config.timeout_seconds = 2;
    let client = FirebaseIdentityClient::new(config).unwrap();

    let err = client.sign_in("a@b.c", "pw").await.unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::Network);
    assert!(err.kind.is_transient());
}
