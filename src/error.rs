//! Error types for SecurePass
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for SecurePass operations
///
/// Backend failures are split by what the caller can do about them:
/// transport failures and 5xx responses are worth retrying later, 4xx
/// responses describe bad input, and 401/403 responses are authentication
/// failures whose meaning depends on the endpoint and the response body.
#[derive(Error, Debug)]
pub enum SecurepassError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure; the backend was never reached or the connection broke
    #[error("Network error: {0}")]
    Network(String),

    /// 4xx response other than 401/403
    #[error("Request rejected ({status}): {message}")]
    Validation {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// 401/403 response; may or may not be about this client's token
    #[error("Authentication failed ({status}): {message}")]
    AmbiguousAuth {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// 5xx response
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Malformed import file
    #[error("Parse error: {0}")]
    Parse(String),

    /// An operation needs a session but none is active
    #[error("Not logged in")]
    NotLoggedIn,

    /// The user declined a confirmation
    #[error("Cancelled")]
    Cancelled,

    /// Terminal input errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP body decoding errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl SecurepassError {
    /// Builds the error for a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::AmbiguousAuth { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Validation { status, message },
        }
    }

    /// HTTP status carried by backend errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. }
            | Self::AmbiguousAuth { status, .. }
            | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Network and server failures get a generic retry hint; authentication
    /// failures that survived classification ask the user to sign in again
    /// if the problem persists.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the SecurePass server. Please try again.".to_string()
            }
            Self::Server { .. } => {
                "The SecurePass server failed to process the request. Please try again later."
                    .to_string()
            }
            Self::AmbiguousAuth { message, .. } => format!(
                "{}. Please sign in again if the problem persists.",
                message.trim_end_matches('.')
            ),
            Self::Validation { message, .. } => message.clone(),
            Self::NotLoggedIn => "You are not signed in. Run `securepass login` first.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for SecurePass operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
