//! Request authenticator integration tests
//!
//! Drives `VaultClient` against a `wiremock` backend and checks which
//! 401/403 responses end the local session.

mod common;

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use securepass::auth::AuthEvent;
use securepass::SecurepassError;

use common::{credentials_json, memory_client};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn backend_error(err: &anyhow::Error) -> &SecurepassError {
    err.downcast_ref::<SecurepassError>()
        .expect("backend failures are SecurepassError")
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": token, "username": "Alice"})),
        )
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Header injection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bearer_token_attached_to_vault_requests() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-123").await;
    Mock::given(method("GET"))
        .and(path("/vault"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(credentials_json(&[1, 2])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    let name = client.login("alice", "pw").await.unwrap();
    assert_eq!(name, "Alice");
    assert!(session.expires_at().unwrap() > chrono::Utc::now());

    let list = client.list().await.unwrap();
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn test_no_token_sent_to_auth_endpoints() {
    let server = MockServer::start().await;
    // Registered first so it wins whenever a token is present.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_login(&server, "fresh").await;

    let (client, session) = memory_client(&server.uri());
    session
        .set_session("stale", chrono::Duration::hours(1), "alice")
        .unwrap();

    client.login("alice", "pw").await.unwrap();
    assert_eq!(session.get_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_login_falls_back_to_entered_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    assert_eq!(client.login("bob", "pw").await.unwrap(), "bob");
    assert_eq!(session.display_name().as_deref(), Some("bob"));
}

// ---------------------------------------------------------------------------
// 401/403 classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_forbidden_business_error_keeps_session() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("POST"))
        .and(path("/vault"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": "site already exists"})),
        )
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();
    let mut events = client.auth_events();

    let payload = securepass::Credential::new("a.com", "alice", Some("pw".to_string())).to_payload();
    let err = client.add(&payload).await.unwrap_err();

    match backend_error(&err) {
        SecurepassError::AmbiguousAuth { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "site already exists");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(session.is_valid());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_expired_token_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("GET"))
        .and(path("/vault"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();
    let mut events = client.auth_events();

    let err = client.list().await.unwrap_err();
    assert_eq!(backend_error(&err).status(), Some(401));
    assert!(!session.is_valid());
    assert!(session.display_name().is_none());
    assert_eq!(
        events.try_recv().unwrap(),
        AuthEvent::LoginRequired {
            path: "/vault".to_string(),
            status: 401
        }
    );
}

#[tokio::test]
async fn test_unauthorized_without_expiry_hint_keeps_live_session() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("DELETE"))
        .and(path("/vault/5"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();

    assert!(client.delete(5).await.is_err());
    assert!(session.is_valid());
}

#[tokio::test]
async fn test_forbidden_with_auth_keyword_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("PUT"))
        .and(path("/vault/5"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();

    let payload = securepass::Credential::new("a.com", "alice", None).to_payload();
    assert!(client.update(5, &payload).await.is_err());
    assert!(!session.is_valid());
}

#[tokio::test]
async fn test_batch_import_never_signs_out() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("POST"))
        .and(path("/vault/batch"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();

    let creds = vec![securepass::Credential::new(
        "a.com",
        "alice",
        Some("pw".to_string()),
    )];
    let err = client.bulk_import(&creds).await.unwrap_err();
    assert!(session.is_valid());

    // The import flow re-applies the classifier itself.
    let message = securepass::transfer::explain_import_failure(&err, &session);
    assert_eq!(message, "Your session has expired. Please sign in again.");
    assert!(!session.is_valid());
}

#[tokio::test]
async fn test_failed_login_clears_nothing_but_reports() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    let mut events = client.auth_events();
    let err = client.login("alice", "wrong").await.unwrap_err();

    match backend_error(&err) {
        SecurepassError::AmbiguousAuth { message, .. } => {
            assert_eq!(message, "Invalid credentials")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!session.is_valid());
    assert!(events.try_recv().is_ok());
}

// ---------------------------------------------------------------------------
// Other statuses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_conflict_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "exists"})))
        .mount(&server)
        .await;

    let (client, _session) = memory_client(&server.uri());
    let err = client.register("alice", "longenough").await.unwrap_err();
    match backend_error(&err) {
        SecurepassError::Validation { status, message } => {
            assert_eq!(*status, 409);
            assert_eq!(
                message,
                "Username already exists. Please choose a different username."
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_not_an_auth_failure() {
    let server = MockServer::start().await;
    mount_login(&server, "tok").await;
    Mock::given(method("GET"))
        .and(path("/vault"))
        .respond_with(ResponseTemplate::new(500).set_body_string("token store unavailable"))
        .mount(&server)
        .await;

    let (client, session) = memory_client(&server.uri());
    client.login("alice", "pw").await.unwrap();

    let err = client.list().await.unwrap_err();
    assert!(matches!(
        backend_error(&err),
        SecurepassError::Server { status: 500, .. }
    ));
    assert!(session.is_valid());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let (client, _session) = memory_client("http://127.0.0.1:1");
    let err = client.login("alice", "pw").await.unwrap_err();
    assert!(matches!(backend_error(&err), SecurepassError::Network(_)));
}
