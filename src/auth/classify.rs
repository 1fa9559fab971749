//! Classification of 401/403 responses
//!
//! The backend does not reliably distinguish "your token is bad" from "your
//! data is bad" on every endpoint. This module holds the single keyword
//! heuristic used to tell the two apart, shared by the request authenticator
//! and the import flow.

/// Phrases whose presence in an error body marks an authentication failure.
pub const AUTH_FAILURE_PHRASES: [&str; 6] = [
    "token",
    "unauthorized",
    "authentication",
    "expired",
    "invalid credentials",
    "forbidden",
];

/// Which family of backend endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// `/auth/*`: login and registration
    Authentication,
    /// `/vault/batch` or `/vault/bulk`: bulk import
    BatchImport,
    /// Everything else
    Resource,
}

impl EndpointKind {
    /// Classifies a request path.
    ///
    /// # Examples
    ///
    /// ```
    /// use securepass::auth::EndpointKind;
    ///
    /// assert_eq!(EndpointKind::of("/auth/login"), EndpointKind::Authentication);
    /// assert_eq!(EndpointKind::of("/vault/batch"), EndpointKind::BatchImport);
    /// assert_eq!(EndpointKind::of("/vault/7"), EndpointKind::Resource);
    /// ```
    pub fn of(path: &str) -> Self {
        if path.contains("/auth/") {
            Self::Authentication
        } else if path.contains("/vault/batch") || path.contains("/vault/bulk") {
            Self::BatchImport
        } else {
            Self::Resource
        }
    }

    /// Whether requests to this endpoint carry the bearer token.
    pub fn is_authenticated(self) -> bool {
        self != Self::Authentication
    }
}

/// What the authenticator does with a failed response before re-raising it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Clear the session and ask the user to sign in again.
    ForceLogout,
    /// Leave the session alone; the caller interprets the error.
    Surface,
}

/// Returns `true` if `message` reads like an authentication failure.
///
/// Matching is case-insensitive against [`AUTH_FAILURE_PHRASES`].
///
/// # Examples
///
/// ```
/// use securepass::auth::mentions_auth_failure;
///
/// assert!(mentions_auth_failure("Token EXPIRED"));
/// assert!(!mentions_auth_failure("site already exists"));
/// ```
pub fn mentions_auth_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_FAILURE_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
}

/// Extracts a human-readable message from an error response body.
///
/// A JSON object yields its `message` field, falling back to `error`; a JSON
/// string yields the string; anything else is returned trimmed as-is.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => ["message", "error"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
        Ok(serde_json::Value::String(s)) => s,
        _ => body.trim().to_string(),
    }
}

/// Decides whether a failed response means this client's session is dead.
///
/// * Only 401 and 403 are ever escalated.
/// * Authentication endpoints always escalate.
/// * Batch-import endpoints never escalate; row-level validation failures
///   come back as 401/403 there.
/// * Other endpoints escalate only when the message mentions an
///   authentication failure. A 401 additionally requires that the local
///   token is already gone or that the message says it is expired or
///   invalid.
///
/// # Examples
///
/// ```
/// use securepass::auth::{classify_failure, EndpointKind, FailureDisposition};
///
/// assert_eq!(
///     classify_failure(EndpointKind::Resource, 403, "site already exists", true),
///     FailureDisposition::Surface
/// );
/// assert_eq!(
///     classify_failure(EndpointKind::Resource, 401, "token expired", true),
///     FailureDisposition::ForceLogout
/// );
/// ```
pub fn classify_failure(
    endpoint: EndpointKind,
    status: u16,
    message: &str,
    has_local_token: bool,
) -> FailureDisposition {
    if status != 401 && status != 403 {
        return FailureDisposition::Surface;
    }

    match endpoint {
        EndpointKind::Authentication => FailureDisposition::ForceLogout,
        EndpointKind::BatchImport => FailureDisposition::Surface,
        EndpointKind::Resource => {
            if !mentions_auth_failure(message) {
                return FailureDisposition::Surface;
            }
            let lower = message.to_lowercase();
            let token_rejected = lower.contains("expired") || lower.contains("invalid");
            if status == 401 && has_local_token && !token_rejected {
                FailureDisposition::Surface
            } else {
                FailureDisposition::ForceLogout
            }
        }
    }
}
