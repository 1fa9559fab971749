//! Bearer-token HTTP wrapper for the SecurePass backend
//!
//! [`RequestAuthenticator`] owns the `reqwest` client and the backend base
//! URL. For each request it:
//!
//! - attaches `Authorization: Bearer <token>` unless the path is under
//!   `/auth/`, and only when the session store has a live token;
//! - maps non-success statuses onto [`SecurepassError`] variants;
//! - for 401/403, runs [`classify_failure`] and, when the failure is a real
//!   authentication failure, clears the session and broadcasts
//!   [`AuthEvent::LoginRequired`] before returning the error.
//!
//! The original error is always returned to the caller; classification only
//! decides whether the logout side effect happens first.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::auth::classify::{classify_failure, error_message, EndpointKind, FailureDisposition};
use crate::error::{Result, SecurepassError};
use crate::session::SessionStore;

/// Notifications emitted by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The session was cleared after a classified authentication failure.
    LoginRequired {
        /// Path of the request that failed
        path: String,
        /// HTTP status of the failure
        status: u16,
    },
}

/// HTTP client wrapper that injects credentials and classifies failures.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use securepass::auth::RequestAuthenticator;
/// use securepass::session::{MemoryBackend, SessionStore};
///
/// let session = Arc::new(SessionStore::open(Arc::new(MemoryBackend::new())).unwrap());
/// let auth = RequestAuthenticator::new(
///     url::Url::parse("http://localhost:8081").unwrap(),
///     session,
///     Duration::from_secs(30),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    /// Underlying reqwest HTTP client.
    http_client: Arc<reqwest::Client>,
    /// Backend base URL; request paths are appended to it.
    base_url: url::Url,
    /// Session consulted for the bearer token and cleared on auth failure.
    session: Arc<SessionStore>,
    /// Broadcast of [`AuthEvent`]s.
    events: broadcast::Sender<AuthEvent>,
}

impl RequestAuthenticator {
    /// Constructs a new authenticator targeting `base_url`.
    ///
    /// The `timeout` applies to each individual HTTP request. No network
    /// I/O is performed at construction time.
    pub fn new(base_url: url::Url, session: Arc<SessionStore>, timeout: Duration) -> Self {
        let http_client = Arc::new(
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                // SAFETY: Default reqwest client construction cannot fail
                // unless TLS initialisation fails, which is a fatal startup
                // condition on any supported platform.
                .expect("failed to build reqwest client"),
        );
        let (events, _) = broadcast::channel(16);

        Self {
            http_client,
            base_url,
            session,
            events,
        }
    }

    /// Returns the session store this authenticator reads from.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Subscribes to [`AuthEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn url_for(&self, path: &str) -> Result<url::Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        url::Url::parse(&joined).map_err(|e| {
            SecurepassError::Config(format!("Invalid request URL {}: {}", joined, e)).into()
        })
    }

    /// Sends a request with an optional JSON body.
    ///
    /// Returns the response when the status is a success.
    ///
    /// # Errors
    ///
    /// - [`SecurepassError::Network`] when the request never completes.
    /// - [`SecurepassError::AmbiguousAuth`] for 401/403, after the session
    ///   has been cleared if the failure was classified as a real
    ///   authentication failure.
    /// - [`SecurepassError::Server`] for 5xx.
    /// - [`SecurepassError::Validation`] for any other non-success status.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = EndpointKind::of(path);
        let url = self.url_for(path)?;
        let mut req = self.http_client.request(method.clone(), url);

        if endpoint.is_authenticated() {
            if let Some(token) = self.session.get_token() {
                req = req.bearer_auth(token);
            } else {
                tracing::debug!(path, "No live session; sending without credentials");
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, path, "Sending request");
        let response = req.send().await.map_err(|e| {
            anyhow::anyhow!(SecurepassError::Network(format!(
                "{} {} failed: {}",
                method, path, e
            )))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = error_message(&raw);
        let code = status.as_u16();

        // Classification sees only what the server said, never the
        // canonical reason phrase substituted below.
        if code == 401 || code == 403 {
            self.on_auth_failure(endpoint, path, code, &message);
        }

        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            message
        };
        Err(SecurepassError::from_status(code, message).into())
    }

    fn on_auth_failure(&self, endpoint: EndpointKind, path: &str, status: u16, message: &str) {
        let has_local_token = self.session.get_token().is_some();
        match classify_failure(endpoint, status, message, has_local_token) {
            FailureDisposition::ForceLogout => {
                if has_local_token && endpoint == EndpointKind::Resource {
                    // The server rejected a token the client still believed
                    // valid; the configured lifetime may be longer than the
                    // server's.
                    tracing::warn!(
                        path,
                        status,
                        "Server rejected a locally valid token; check session.token_lifetime_secs"
                    );
                }
                tracing::warn!(path, status, reason = message, "Authentication failure; signing out");
                self.session.clear();
                // No subscribers is fine.
                let _ = self.events.send(AuthEvent::LoginRequired {
                    path: path.to_string(),
                    status,
                });
            }
            FailureDisposition::Surface => {
                tracing::debug!(path, status, reason = message, "Auth-coded failure left to caller");
            }
        }
    }
}
