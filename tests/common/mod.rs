use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;

use securepass::api::VaultClient;
use securepass::auth::RequestAuthenticator;
use securepass::session::{MemoryBackend, SessionStore};

/// Client against `base_url` with an in-memory session.
#[allow(dead_code)]
pub fn memory_client(base_url: &str) -> (Arc<VaultClient>, Arc<SessionStore>) {
    let session =
        Arc::new(SessionStore::open(Arc::new(MemoryBackend::new())).expect("memory store opens"));
    let auth = RequestAuthenticator::new(
        url::Url::parse(base_url).expect("valid url"),
        Arc::clone(&session),
        Duration::from_secs(5),
    );
    let client = Arc::new(VaultClient::new(auth, chrono::Duration::hours(1)));
    (client, session)
}

/// Credential list body as the backend returns it.
#[allow(dead_code)]
pub fn credentials_json(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "site": format!("site{}.com", id),
                    "username": "alice",
                    "password": "Passw0rd!"
                })
            })
            .collect(),
    )
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
