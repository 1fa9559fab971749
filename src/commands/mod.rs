/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`     -- login, register, logout, status
- `vault`    -- list, add, update, delete, dedupe, refresh
- `transfer` -- import and export
- `prompt`   -- terminal input and the confirmation responder

Every handler receives a [`Context`] holding the session, the vault and the
notification services built from the configuration.
*/

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::VaultClient;
use crate::auth::{AuthEvent, RequestAuthenticator};
use crate::config::{Config, SessionBackendKind};
use crate::confirm::ConfirmationService;
use crate::error::{Result, SecurepassError};
use crate::session::{KeyringBackend, MemoryBackend, SessionBackend, SessionStore};
use crate::toast::{Toast, ToastService, ToastTray};
use crate::vault::Vault;

pub mod auth;
pub mod prompt;
pub mod transfer;
pub mod vault;

/// Shared state for one CLI invocation.
pub struct Context {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub vault: Vault,
    pub confirmations: ConfirmationService,
    pub toasts: ToastService,
    toast_rx: broadcast::Receiver<Toast>,
    tray: ToastTray,
    auth_rx: broadcast::Receiver<AuthEvent>,
    responder: JoinHandle<()>,
}

impl Context {
    /// Builds the session store, client and services. Needs a Tokio runtime.
    ///
    /// `assume_yes` answers every confirmation with confirm.
    pub fn new(config: Config, assume_yes: bool) -> Result<Self> {
        let base_url = config.base_url()?;
        let session = Arc::new(open_session(config.session.backend, &base_url)?);

        let auth = RequestAuthenticator::new(
            base_url,
            Arc::clone(&session),
            Duration::from_secs(config.api.timeout_seconds),
        );
        let client = Arc::new(VaultClient::new(auth, config.session.session_ttl()));
        let auth_rx = client.auth_events();
        let vault = Vault::new(client, config.sync.debounce());

        let confirmations = ConfirmationService::new();
        let responder = prompt::spawn_responder(confirmations.clone(), assume_yes);
        let toasts = ToastService::new(Duration::from_millis(config.ui.toast_duration_ms));
        let toast_rx = toasts.subscribe();

        Ok(Self {
            config,
            session,
            vault,
            confirmations,
            toasts,
            toast_rx,
            tray: ToastTray::new(),
            auth_rx,
            responder,
        })
    }

    /// Fails with [`SecurepassError::NotLoggedIn`] unless a live session
    /// exists.
    pub fn require_session(&self) -> Result<()> {
        if self.session.is_valid() {
            Ok(())
        } else {
            Err(SecurepassError::NotLoggedIn.into())
        }
    }

    /// Moves newly published toasts onto the tray.
    fn collect_toasts(&mut self) {
        while let Ok(toast) = self.toast_rx.try_recv() {
            self.tray.push(toast);
        }
    }

    /// Toasts published so far that have not yet expired.
    pub fn visible_toasts(&mut self) -> Vec<Toast> {
        self.collect_toasts();
        self.tray.active()
    }

    /// Prints the toasts still on display, then any forced sign-out.
    /// Called once when a command finishes.
    pub fn flush(&mut self) {
        for toast in self.visible_toasts() {
            println!("{}", toast);
        }
        let mut signed_out = false;
        while let Ok(AuthEvent::LoginRequired { path, status }) = self.auth_rx.try_recv() {
            tracing::debug!(path = %path, status, "Forced sign-out observed");
            signed_out = true;
        }
        if signed_out {
            println!(
                "{} Run {} to sign in again.",
                "Your session has ended.".yellow(),
                "securepass login".cyan()
            );
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.responder.abort();
    }
}

/// Opens the configured session store. An unreadable keyring falls back to
/// memory so commands that need no session keep working.
fn open_session(kind: SessionBackendKind, base_url: &url::Url) -> Result<SessionStore> {
    match kind {
        SessionBackendKind::Keyring => {
            let backend: Arc<dyn SessionBackend> =
                Arc::new(KeyringBackend::new(keyring_account(base_url)));
            SessionStore::open(backend).or_else(|e| {
                tracing::warn!("Keyring unavailable, keeping the session in memory: {}", e);
                SessionStore::open(Arc::new(MemoryBackend::new()))
            })
        }
        SessionBackendKind::Memory => SessionStore::open(Arc::new(MemoryBackend::new())),
    }
}

/// Keyring account for a server: its host and port, so sessions for
/// different servers do not overwrite each other.
fn keyring_account(base_url: &url::Url) -> String {
    let host = base_url.host_str().unwrap_or("localhost");
    match base_url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Prints an error the way the user should see it.
pub fn report_error(error: &anyhow::Error) {
    let message = match error.downcast_ref::<SecurepassError>() {
        Some(e) => e.user_message(),
        None => error.to_string(),
    };
    eprintln!("{} {}", "Error:".red().bold(), message);
}
