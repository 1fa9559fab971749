//! Wire types for the SecurePass REST API

use serde::{Deserialize, Serialize};

/// A stored credential.
///
/// `id` is assigned by the backend; `0` means the credential has not been
/// persisted yet (for example, a record read from an import file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Backend-assigned identity
    #[serde(default)]
    pub id: i64,

    /// Site or service name
    pub site: String,

    /// Account name on the site
    #[serde(default)]
    pub username: String,

    /// Plain-text password, when the backend returned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credential {
    /// Creates a not-yet-persisted credential.
    pub fn new(
        site: impl Into<String>,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            site: site.into(),
            username: username.into(),
            password,
        }
    }

    /// Request body for creating or updating this credential.
    pub fn to_payload(&self) -> CredentialPayload {
        CredentialPayload {
            site: self.site.clone(),
            username: self.username.clone(),
            password: self.password.clone().filter(|p| !p.is_empty()),
        }
    }
}

/// Body of `POST /vault`, `PUT /vault/{id}` and each entry of
/// `POST /vault/batch`. Never carries an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    /// Site or service name
    pub site: String,

    /// Account name on the site
    pub username: String,

    /// New password; omitted to keep the stored one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    /// Account name
    pub username: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Response of the authentication endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token
    pub token: String,

    /// Canonical username, when the server returns one
    #[serde(default)]
    pub username: Option<String>,
}

/// Generic `{message}` response of the mutation endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    /// Human-readable outcome
    #[serde(default)]
    pub message: Option<String>,
}
