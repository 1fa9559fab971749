//! Vault and transfer commands against a failing backend
//!
//! Commands run by the user read the list directly, so a backend failure
//! must reach the caller instead of looking like an empty vault.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use securepass::commands::{self, Context};
use securepass::config::{Config, SessionBackendKind};
use securepass::SecurepassError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn failing_vault_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vault"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;
    server
}

async fn signed_in_context(server: &MockServer) -> Context {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.session.backend = SessionBackendKind::Memory;
    let ctx = Context::new(config, true).unwrap();
    ctx.vault.client().login("alice", "pw").await.unwrap();
    ctx
}

fn is_server_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<SecurepassError>(),
        Some(SecurepassError::Server { status: 500, .. })
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_export_fails_and_keeps_existing_file() {
    let server = failing_vault_server().await;
    let mut ctx = signed_in_context(&server).await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("backup.json");
    let original = r#"[{"site":"a.com","username":"alice","password":"pw"}]"#;
    std::fs::write(&file, original).unwrap();

    let err = commands::transfer::export(&mut ctx, &file, None)
        .await
        .unwrap_err();
    assert!(is_server_error(&err));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), original);
}

#[tokio::test]
async fn test_list_surfaces_server_error() {
    let server = failing_vault_server().await;
    let mut ctx = signed_in_context(&server).await;

    let err = commands::vault::list(&mut ctx, None, false, false)
        .await
        .unwrap_err();
    assert!(is_server_error(&err));
}

#[tokio::test]
async fn test_delete_reports_server_error_not_missing_credential() {
    let server = failing_vault_server().await;
    let mut ctx = signed_in_context(&server).await;

    let err = commands::vault::delete(&mut ctx, 7).await.unwrap_err();
    assert!(is_server_error(&err));
}

#[tokio::test]
async fn test_dedupe_surfaces_server_error() {
    let server = failing_vault_server().await;
    let mut ctx = signed_in_context(&server).await;

    let err = commands::vault::dedupe(&mut ctx).await.unwrap_err();
    assert!(is_server_error(&err));
}
