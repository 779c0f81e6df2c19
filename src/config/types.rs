//! Configuration data model.
//!
//! Struct definitions plus default values. Loading and precedence live in
//! `config::loader` and `config::env`.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL,
};
use crate::error::ConfigError;

/// Top-level runtime configuration, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub api: ApiConfig,
    /// Where the token record is persisted. `None` when no per-user config
    /// root could be resolved on this platform.
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Validate OAuth settings and return the consumer credentials.
    pub fn oauth_credentials(&self) -> Result<ClientCredentials, ConfigError> {
        if !self.oauth.use_oauth {
            return Err(ConfigError::Invalid(
                "OAuth is not enabled; set `use_oauth = true` under [oauth] or BBCLI_USE_OAUTH=true"
                    .to_string(),
            ));
        }
        if self.oauth.client_id.is_empty() {
            return Err(ConfigError::Invalid(
                "OAuth client_id is not configured; set BBCLI_CLIENT_ID or `client_id` under [oauth]"
                    .to_string(),
            ));
        }
        if self.oauth.client_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "OAuth client_secret is not configured; set BBCLI_CLIENT_SECRET or `client_secret` under [oauth]"
                    .to_string(),
            ));
        }
        Ok(ClientCredentials {
            client_id: self.oauth.client_id.clone(),
            client_secret: self.oauth.client_secret.clone(),
        })
    }

    /// Resolved token file path or a configuration error.
    pub fn token_file_path(&self) -> Result<PathBuf, ConfigError> {
        self.token_file.clone().ok_or_else(|| {
            ConfigError::Invalid(
                "unable to resolve a per-user config directory for the token file; pass --token-file"
                    .to_string(),
            )
        })
    }
}

/// OAuth consumer and credential-authority endpoints.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub use_oauth: bool,
    pub auth_url: String,
    pub token_url: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            use_oauth: false,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Remote REST API settings used by the authenticated client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Validated confidential-client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Fallback consumer credentials supplied by the process at startup.
///
/// Only fills fields left empty by the config file and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl DefaultCredentials {
    /// Credentials captured by `build.rs` from the release build environment.
    pub fn from_build_env() -> Self {
        Self {
            client_id: crate::build_info::DEFAULT_CLIENT_ID.to_string(),
            client_secret: crate::build_info::DEFAULT_CLIENT_SECRET.to_string(),
        }
    }
}

/// On-disk TOML shape. Every field is optional so partial files work.
#[derive(Debug, Default, Deserialize)]
pub(super) struct FileConfig {
    #[serde(default)]
    pub(super) oauth: FileOAuthConfig,
    #[serde(default)]
    pub(super) api: FileApiConfig,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileOAuthConfig {
    pub(super) client_id: Option<String>,
    pub(super) client_secret: Option<String>,
    pub(super) use_oauth: Option<bool>,
    pub(super) auth_url: Option<String>,
    pub(super) token_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileApiConfig {
    pub(super) base_url: Option<String>,
    pub(super) timeout_secs: Option<u64>,
}
