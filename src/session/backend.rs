//! Session persistence via OS keyring or process memory
//!
//! The keyring backend stores the serialized [`Session`] in the operating
//! system's native credential store (Keychain on macOS, Secret Service on
//! Linux, Windows Credential Manager on Windows), so a login survives between
//! CLI invocations. The memory backend keeps it for the life of the process.

use std::sync::Mutex;

use crate::error::{Result, SecurepassError};
use crate::session::store::Session;

/// Storage for at most one session.
pub trait SessionBackend: Send + Sync {
    /// Returns the stored session, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<Session>>;

    /// Replaces the stored session.
    fn save(&self, session: &Session) -> Result<()>;

    /// Removes the stored session. Removing nothing is not an error.
    fn delete(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// KeyringBackend
// ---------------------------------------------------------------------------

/// Keyring accessor for one backend account.
///
/// Each backend (identified by its host) gets its own keyring entry so that
/// sessions for different servers do not overwrite each other.
///
/// # Examples
///
/// ```no_run
/// use securepass::session::{KeyringBackend, SessionBackend};
///
/// let backend = KeyringBackend::new("localhost:8081");
/// let stored = backend.load().unwrap();
/// assert!(stored.is_none() || stored.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    account: String,
}

impl KeyringBackend {
    /// Creates an accessor for the keyring entry of `account`.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    /// Builds the keyring service name for the given account.
    ///
    /// The name is prefixed with `securepass-` to avoid collisions with
    /// other applications that use the same keyring.
    fn service_name(account: &str) -> String {
        format!("securepass-{}", account)
    }

    fn entry(&self) -> Result<keyring::Entry> {
        let service = Self::service_name(&self.account);
        keyring::Entry::new(&service, &self.account).map_err(|e| SecurepassError::Keyring(e).into())
    }
}

impl SessionBackend for KeyringBackend {
    fn load(&self) -> Result<Option<Session>> {
        match self.entry()?.get_password() {
            Ok(json_str) => {
                let session: Session = serde_json::from_str(&json_str)?;
                Ok(Some(session))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecurepassError::Keyring(e).into()),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        let json_str = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(SecurepassError::Keyring)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecurepassError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Process-lifetime session storage.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Session>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_session() -> Session {
        Session {
            token: "tok".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            display_name: "alice".to_string(),
        }
    }

    #[test]
    fn test_service_name_has_correct_prefix() {
        assert_eq!(
            KeyringBackend::service_name("localhost:8081"),
            "securepass-localhost:8081"
        );
    }

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.load().unwrap().is_none());

        backend.save(&sample_session()).unwrap();
        let loaded = backend.load().unwrap().expect("session stored");
        assert_eq!(loaded.token, "tok");
        assert_eq!(loaded.display_name, "alice");

        backend.delete().unwrap();
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_backend_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.delete().unwrap();
        backend.delete().unwrap();
    }

    #[test]
    #[ignore = "requires system keyring"]
    fn test_keyring_backend_roundtrip() {
        let backend = KeyringBackend::new("securepass-test-account");
        backend.save(&sample_session()).expect("save");
        let loaded = backend.load().expect("load").expect("present");
        assert_eq!(loaded.token, "tok");
        backend.delete().expect("delete");
        assert!(backend.load().expect("load after delete").is_none());
    }
}
