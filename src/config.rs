//! Configuration management for SecurePass
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, SecurepassError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for SecurePass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Session lifetime and storage
    #[serde(default)]
    pub session: SessionConfig,
    /// Credential list reload behavior
    #[serde(default)]
    pub sync: SyncConfig,
    /// Terminal presentation
    #[serde(default)]
    pub ui: UiConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server base URL; request paths such as `/vault` are appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Where the session is kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// OS keyring
    Keyring,
    /// Process memory; every run starts signed out
    Memory,
}

impl std::str::FromStr for SessionBackendKind {
    type Err = SecurepassError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(SecurepassError::Config(format!(
                "Invalid session backend: {}. Must be one of: keyring, memory",
                other
            ))),
        }
    }
}

/// Session lifetime and storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of tokens issued by the server
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,

    /// Fraction of the lifetime after which the client stops using a token
    #[serde(default = "default_expiry_safety_ratio")]
    pub expiry_safety_ratio: f64,

    /// Storage backend
    #[serde(default = "default_session_backend")]
    pub backend: SessionBackendKind,
}

fn default_token_lifetime() -> u64 {
    86_400
}

fn default_expiry_safety_ratio() -> f64 {
    0.96
}

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 86_400;

fn default_session_backend() -> SessionBackendKind {
    SessionBackendKind::Keyring
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: default_token_lifetime(),
            expiry_safety_ratio: default_expiry_safety_ratio(),
            backend: default_session_backend(),
        }
    }
}

impl SessionConfig {
    /// Client-side lifetime of a fresh token: the server lifetime scaled by
    /// the safety ratio.
    pub fn session_ttl(&self) -> chrono::Duration {
        let millis =
            (self.token_lifetime_secs as f64 * 1000.0 * self.expiry_safety_ratio).round() as i64;
        chrono::Duration::milliseconds(millis)
    }
}

/// Credential list reload behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period before a burst of reload requests turns into one fetch
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Terminal presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Default toast duration
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

fn default_toast_duration_ms() -> u64 {
    3500
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SecurepassError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SecurepassError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("SECUREPASS_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("SECUREPASS_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid SECUREPASS_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(lifetime) = std::env::var("SECUREPASS_TOKEN_LIFETIME_SECS") {
            if let Ok(value) = lifetime.parse() {
                self.session.token_lifetime_secs = value;
            } else {
                tracing::warn!("Invalid SECUREPASS_TOKEN_LIFETIME_SECS: {}", lifetime);
            }
        }

        if let Ok(ratio) = std::env::var("SECUREPASS_EXPIRY_SAFETY_RATIO") {
            if let Ok(value) = ratio.parse() {
                self.session.expiry_safety_ratio = value;
            } else {
                tracing::warn!("Invalid SECUREPASS_EXPIRY_SAFETY_RATIO: {}", ratio);
            }
        }

        if let Ok(backend) = std::env::var("SECUREPASS_SESSION_BACKEND") {
            match backend.parse() {
                Ok(value) => self.session.backend = value,
                Err(e) => tracing::warn!("Ignoring SECUREPASS_SESSION_BACKEND: {}", e),
            }
        }

        if let Ok(debounce) = std::env::var("SECUREPASS_DEBOUNCE_MS") {
            if let Ok(value) = debounce.parse() {
                self.sync.debounce_ms = value;
            } else {
                tracing::warn!("Invalid SECUREPASS_DEBOUNCE_MS: {}", debounce);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.api.base_url = url.clone();
        }
        if cli.ephemeral {
            self.session.backend = SessionBackendKind::Memory;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Parsed server base URL.
    ///
    /// # Errors
    ///
    /// Returns error if `api.base_url` is not an absolute http(s) URL
    pub fn base_url(&self) -> Result<url::Url> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| {
            SecurepassError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SecurepassError::Config(format!(
                "api.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }
        Ok(parsed)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.api.timeout_seconds == 0 {
            return Err(SecurepassError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.token_lifetime_secs == 0 {
            return Err(SecurepassError::Config(
                "session.token_lifetime_secs must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.token_lifetime_secs > MAX_TOKEN_LIFETIME_SECS {
            return Err(SecurepassError::Config(format!(
                "session.token_lifetime_secs must be at most {}",
                MAX_TOKEN_LIFETIME_SECS
            ))
            .into());
        }

        let ratio = self.session.expiry_safety_ratio;
        if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
            return Err(SecurepassError::Config(
                "session.expiry_safety_ratio must be greater than 0.0 and at most 1.0".to_string(),
            )
            .into());
        }

        if self.sync.debounce_ms > 10_000 {
            return Err(SecurepassError::Config(
                "sync.debounce_ms must be at most 10000".to_string(),
            )
            .into());
        }

        if self.ui.toast_duration_ms == 0 {
            return Err(SecurepassError::Config(
                "ui.toast_duration_ms must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
