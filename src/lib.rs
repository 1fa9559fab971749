//! SecurePass - password vault client library
//!
//! This library provides the client side of SecurePass: session handling,
//! authenticated access to the SecurePass REST API, a synchronized view of
//! the credential list, and the supporting confirmation and notification
//! services used by the CLI.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: token, expiry and display name, stored in the OS keyring or memory
//! - `auth`: bearer-token injection and 401/403 classification
//! - `api`: typed client for the backend endpoints
//! - `vault`: debounced, deduplicated credential list plus search, duplicates and form state
//! - `confirm`: awaitable confirmation requests
//! - `toast`: self-expiring notifications
//! - `password`: strength rules and generation
//! - `transfer`: JSON/CSV import and export
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use securepass::api::VaultClient;
//! use securepass::auth::RequestAuthenticator;
//! use securepass::session::{MemoryBackend, SessionStore};
//! use securepass::vault::Vault;
//! use securepass::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = Arc::new(SessionStore::open(Arc::new(MemoryBackend::new()))?);
//!     let auth = RequestAuthenticator::new(config.base_url()?, session, Duration::from_secs(30));
//!     let client = Arc::new(VaultClient::new(auth, config.session.session_ttl()));
//!     client.login("alice", "Sup3r$ecret").await?;
//!
//!     let vault = Vault::new(client, config.sync.debounce());
//!     for cred in vault.refresh().await.iter() {
//!         println!("{} {}", cred.site, cred.username);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod password;
pub mod session;
pub mod toast;
pub mod transfer;
pub mod vault;

// Re-export commonly used types
pub use api::{Credential, VaultClient};
pub use config::Config;
pub use error::{Result, SecurepassError};
pub use session::SessionStore;
pub use vault::Vault;
