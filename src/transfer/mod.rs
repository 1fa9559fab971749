//! Credential import and export
//!
//! # Module Layout
//!
//! - [`csv`]  -- RFC 4180 files with a `site,username[,password]` header
//! - [`json`] -- arrays of `{site, username, password}` objects

pub mod csv;
pub mod json;

use std::path::Path;

use clap::ValueEnum;

use crate::api::types::Credential;
use crate::auth::mentions_auth_failure;
use crate::error::{Result, SecurepassError};
use crate::session::SessionStore;

/// File format for import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Uses `explicit` when given, otherwise the file extension.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Result<Self> {
        explicit.or_else(|| Self::from_path(path)).ok_or_else(|| {
            SecurepassError::Parse(format!(
                "Cannot tell the format of {}; pass --format json|csv",
                path.display()
            ))
            .into()
        })
    }
}

/// Parses `text` in the given format.
pub fn parse(text: &str, format: Format) -> Result<Vec<Credential>> {
    match format {
        Format::Json => json::parse(text),
        Format::Csv => csv::parse(text),
    }
}

/// Serializes credentials in the given format.
pub fn render(credentials: &[Credential], format: Format) -> Result<String> {
    match format {
        Format::Json => json::write(credentials),
        Format::Csv => Ok(csv::write(credentials)),
    }
}

/// Checks the batch endpoint's contract: every row has a site and a
/// password.
pub fn validate_for_import(credentials: &[Credential]) -> Result<()> {
    if credentials.is_empty() {
        return Err(SecurepassError::Parse("No credentials to import".to_string()).into());
    }
    for (i, cred) in credentials.iter().enumerate() {
        let missing = if cred.site.trim().is_empty() {
            "site"
        } else if cred.password.as_deref().map_or(true, |p| p.trim().is_empty()) {
            "password"
        } else {
            continue;
        };
        return Err(SecurepassError::Parse(format!(
            "entry {}: missing {}",
            i + 1,
            missing
        ))
        .into());
    }
    Ok(())
}

/// Reads and validates an import file.
pub async fn read_file(path: &Path, format: Option<Format>) -> Result<Vec<Credential>> {
    let format = Format::resolve(format, path)?;
    let text = tokio::fs::read_to_string(path).await?;
    let credentials = parse(&text, format)?;
    validate_for_import(&credentials)?;
    tracing::debug!(
        path = %path.display(),
        count = credentials.len(),
        "Parsed import file"
    );
    Ok(credentials)
}

/// Writes the credentials to `path`.
pub async fn write_file(path: &Path, format: Option<Format>, credentials: &[Credential]) -> Result<()> {
    let format = Format::resolve(format, path)?;
    let text = render(credentials, format)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Message shown for a failed bulk import.
///
/// A 401/403 that the authenticator left alone (the batch endpoint never
/// signs out on its own) is looked at again here: if the session is already
/// gone or the message sounds like an authentication failure, the session is
/// cleared and the user is told to sign in again.
pub fn explain_import_failure(error: &anyhow::Error, session: &SessionStore) -> String {
    match error.downcast_ref::<SecurepassError>() {
        Some(SecurepassError::AmbiguousAuth { message, .. }) => {
            if !session.is_valid() || mentions_auth_failure(message) {
                session.clear();
                "Your session has expired. Please sign in again.".to_string()
            } else {
                format!(
                    "{}. Please sign in again if the problem persists.",
                    message.trim_end_matches('.')
                )
            }
        }
        Some(e) => e.user_message(),
        None => error.to_string(),
    }
}
