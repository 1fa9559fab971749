//! Typed client for the SecurePass REST API
//!
//! [`VaultClient`] maps each backend endpoint onto one async method. All
//! requests go through [`RequestAuthenticator`], so bearer tokens and
//! 401/403 handling are uniform. The client holds no credential state of its
//! own; the list endpoint feeds the synchronizer in [`crate::vault::sync`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use reqwest::Method;

use crate::api::types::{ApiMessage, AuthRequest, AuthResponse, Credential, CredentialPayload};
use crate::auth::{AuthEvent, RequestAuthenticator};
use crate::error::{Result, SecurepassError};
use crate::session::SessionStore;
use crate::vault::sync::CredentialSource;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const VAULT_PATH: &str = "/vault";
const BATCH_PATH: &str = "/vault/batch";

/// Client for the SecurePass backend.
#[derive(Debug, Clone)]
pub struct VaultClient {
    auth: RequestAuthenticator,
    session_ttl: Duration,
}

impl VaultClient {
    /// Creates a client.
    ///
    /// `session_ttl` is how long a freshly issued token is used before the
    /// client considers it expired.
    pub fn new(auth: RequestAuthenticator, session_ttl: Duration) -> Self {
        Self { auth, session_ttl }
    }

    /// Session store backing this client.
    pub fn session(&self) -> &Arc<SessionStore> {
        self.auth.session()
    }

    /// Subscribes to authentication events (forced sign-outs).
    pub fn auth_events(&self) -> tokio::sync::broadcast::Receiver<AuthEvent> {
        self.auth.subscribe()
    }

    /// Signs in and stores the session.
    ///
    /// Returns the display name: the username echoed by the server, or the
    /// one that was entered.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        self.authenticate(LOGIN_PATH, username, password).await
    }

    /// Creates an account and stores the resulting session.
    ///
    /// # Errors
    ///
    /// A duplicate username (409) is reported as
    /// [`SecurepassError::Validation`] with a readable message.
    pub async fn register(&self, username: &str, password: &str) -> Result<String> {
        self.authenticate(REGISTER_PATH, username, password)
            .await
            .map_err(|e| {
                let conflict = matches!(
                    e.downcast_ref::<SecurepassError>(),
                    Some(SecurepassError::Validation { status: 409, .. })
                );
                if conflict {
                    SecurepassError::Validation {
                        status: 409,
                        message: "Username already exists. Please choose a different username."
                            .to_string(),
                    }
                    .into()
                } else {
                    e
                }
            })
    }

    async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<String> {
        let body = AuthRequest { username, password };
        let response = self.auth.send(Method::POST, path, Some(&body)).await?;
        let auth: AuthResponse = response.json().await?;

        let display_name = auth
            .username
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| username.to_string());
        self.session()
            .set_session(auth.token, self.session_ttl, display_name.clone())?;
        Ok(display_name)
    }

    /// Discards the local session. The backend keeps no session state.
    pub fn logout(&self) {
        self.session().clear();
    }

    /// Fetches every credential of the signed-in user.
    pub async fn list(&self) -> Result<Vec<Credential>> {
        let response = self
            .auth
            .send::<()>(Method::GET, VAULT_PATH, None)
            .await?;
        Ok(response.json().await?)
    }

    /// Creates a credential.
    pub async fn add(&self, payload: &CredentialPayload) -> Result<String> {
        let response = self
            .auth
            .send(Method::POST, VAULT_PATH, Some(payload))
            .await?;
        Ok(message_or(response, "Credential saved").await)
    }

    /// Replaces the credential with the given id.
    pub async fn update(&self, id: i64, payload: &CredentialPayload) -> Result<String> {
        let path = format!("{}/{}", VAULT_PATH, id);
        let response = self.auth.send(Method::PUT, &path, Some(payload)).await?;
        Ok(message_or(response, "Updated").await)
    }

    /// Deletes the credential with the given id.
    pub async fn delete(&self, id: i64) -> Result<String> {
        let path = format!("{}/{}", VAULT_PATH, id);
        let response = self.auth.send::<()>(Method::DELETE, &path, None).await?;
        Ok(message_or(response, "Deleted").await)
    }

    /// Imports credentials in one request. Ids are stripped; the backend
    /// assigns new ones.
    pub async fn bulk_import(&self, credentials: &[Credential]) -> Result<String> {
        let payload: Vec<CredentialPayload> =
            credentials.iter().map(Credential::to_payload).collect();
        let response = self
            .auth
            .send(Method::POST, BATCH_PATH, Some(&payload))
            .await?;
        let fallback = format!("Imported {} credentials", payload.len());
        Ok(message_or(response, &fallback).await)
    }
}

/// Reads the `{message}` body, falling back when it is missing or unreadable.
async fn message_or(response: reqwest::Response, fallback: &str) -> String {
    response
        .json::<ApiMessage>()
        .await
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl CredentialSource for VaultClient {
    async fn fetch_credentials(&self) -> Result<Vec<Credential>> {
        self.list().await
    }
}
