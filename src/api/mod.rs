//! SecurePass backend API
//!
//! - [`client`] -- [`VaultClient`], one method per endpoint
//! - [`types`]  -- request and response bodies

pub mod client;
pub mod types;

pub use client::VaultClient;
pub use types::{ApiMessage, AuthResponse, Credential, CredentialPayload};
