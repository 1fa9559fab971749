//! Expiry-checked session accessor
//!
//! [`SessionStore`] never hands out a stale token: every read compares the
//! stored expiry against the clock and clears an expired session before
//! returning. No background timer is involved.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SecurepassError};
use crate::session::backend::SessionBackend;
use crate::session::clock::{Clock, SystemClock};

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token issued by the backend.
    pub token: String,

    /// Instant after which the client treats the token as unusable.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Name shown to the user.
    pub display_name: String,
}

impl Session {
    /// Returns `true` once `now` has reached the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Owner of the current session.
///
/// The session is cached in memory and written through to the backend.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::Duration;
/// use securepass::session::{MemoryBackend, SessionStore};
///
/// let store = SessionStore::open(Arc::new(MemoryBackend::new())).unwrap();
/// store.set_session("tok", Duration::hours(1), "alice").unwrap();
/// assert_eq!(store.get_token().as_deref(), Some("tok"));
/// store.clear();
/// assert!(!store.is_valid());
/// ```
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<Session>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_session", &self.lock().is_some())
            .finish()
    }
}

impl SessionStore {
    /// Opens the store using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn open(backend: Arc<dyn SessionBackend>) -> Result<Self> {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    /// Opens the store with an explicit clock.
    ///
    /// A session that already expired while stored is discarded here.
    pub fn with_clock(backend: Arc<dyn SessionBackend>, clock: Arc<dyn Clock>) -> Result<Self> {
        let stored = backend.load()?;
        let store = Self {
            backend,
            clock,
            current: Mutex::new(stored),
        };
        // Drops an expired session left over from a previous run.
        store.current_session();
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a new session expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write. The in-memory
    /// session is still updated in that case.
    ///
    /// Returns a configuration error, leaving the store untouched, if the
    /// expiry falls outside the representable date range.
    pub fn set_session(
        &self,
        token: impl Into<String>,
        ttl: Duration,
        display_name: impl Into<String>,
    ) -> Result<()> {
        let expires_at = self.clock.now().checked_add_signed(ttl).ok_or_else(|| {
            SecurepassError::Config(format!(
                "Session lifetime of {} seconds is out of range",
                ttl.num_seconds()
            ))
        })?;
        let session = Session {
            token: token.into(),
            expires_at,
            display_name: display_name.into(),
        };
        tracing::info!(
            display_name = %session.display_name,
            expires_at = %session.expires_at,
            "Session established"
        );
        let mut guard = self.lock();
        *guard = Some(session.clone());
        self.backend.save(&session)
    }

    /// Returns the current session if it has not expired.
    ///
    /// An expired session is cleared before returning `None`.
    pub fn current_session(&self) -> Option<Session> {
        let mut guard = self.lock();
        let now = self.clock.now();
        if !guard.as_ref().is_some_and(|s| s.is_expired_at(now)) {
            return guard.clone();
        }

        if let Some(stale) = guard.take() {
            tracing::info!(expires_at = %stale.expires_at, "Session expired; clearing");
        }
        // Still under the lock so a concurrent set_session is not erased.
        self.delete_from_backend();
        None
    }

    /// Returns the bearer token, or `None` when absent or expired.
    pub fn get_token(&self) -> Option<String> {
        self.current_session().map(|s| s.token)
    }

    /// Returns the display name while the session is valid.
    pub fn display_name(&self) -> Option<String> {
        self.current_session().map(|s| s.display_name)
    }

    /// Returns the expiry of the current session.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.current_session().map(|s| s.expires_at)
    }

    /// Returns `true` when a token is present and not expired.
    pub fn is_valid(&self) -> bool {
        self.current_session().is_some()
    }

    /// Removes token, expiry and display name. Idempotent.
    pub fn clear(&self) {
        let mut guard = self.lock();
        if guard.take().is_some() {
            tracing::info!("Session cleared");
        }
        self.delete_from_backend();
    }

    fn delete_from_backend(&self) {
        if let Err(e) = self.backend.delete() {
            tracing::warn!("Failed to remove stored session: {}", e);
        }
    }
}
