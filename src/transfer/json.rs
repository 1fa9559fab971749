//! JSON credential files: an array of `{site, username, password}` objects

use serde::Deserialize;

use crate::api::types::{Credential, CredentialPayload};
use crate::error::{Result, SecurepassError};

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    site: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: Option<String>,
}

/// Reads credentials from a JSON array. Unknown fields, including `id`, are
/// ignored.
pub fn parse(text: &str) -> Result<Vec<Credential>> {
    let text = text.trim_start_matches('\u{feff}');
    let entries: Vec<Entry> = serde_json::from_str(text)
        .map_err(|e| SecurepassError::Parse(format!("invalid JSON credential list: {}", e)))?;
    Ok(entries
        .into_iter()
        .map(|e| Credential::new(e.site, e.username, e.password.filter(|p| !p.is_empty())))
        .collect())
}

/// Pretty-printed JSON array without ids.
pub fn write(credentials: &[Credential]) -> Result<String> {
    let entries: Vec<CredentialPayload> = credentials
        .iter()
        .map(|c| CredentialPayload {
            site: c.site.clone(),
            username: c.username.clone(),
            password: c.password.clone(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_ids_and_extras() {
        let text = r#"[
            {"id": 5, "site": "github.com", "username": "alice", "password": "pw", "notes": "x"},
            {"site": "gitlab.com"}
        ]"#;
        let creds = parse(text).unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].id, 0);
        assert_eq!(creds[0].password.as_deref(), Some("pw"));
        assert_eq!(creds[1].username, "");
        assert!(creds[1].password.is_none());
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse(r#"{"site":"github.com"}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SecurepassError>(),
            Some(SecurepassError::Parse(_))
        ));
    }

    #[test]
    fn test_write_omits_ids() {
        let mut cred = Credential::new("github.com", "alice", Some("pw".to_string()));
        cred.id = 42;
        let text = write(&[cred]).unwrap();
        assert!(!text.contains("42"));
        assert_eq!(parse(&text).unwrap()[0].site, "github.com");
    }
}
