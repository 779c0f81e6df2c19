//! Binary-local application orchestration helpers.
//!
//! `main.rs` keeps process wiring (args, logging, config); this module hosts
//! the subcommand handlers and their shared construction helpers.

pub(crate) mod commands;

use std::sync::Arc;

use bbcli::auth::{TokenExchanger, TokenStore};
use bbcli::config::{ClientCredentials, Config};
use bbcli::error::CliError;

/// Validated OAuth pieces every authenticated command needs.
pub(crate) struct OAuthSession {
    pub(crate) credentials: ClientCredentials,
    pub(crate) store: TokenStore,
    pub(crate) grant: Arc<TokenExchanger>,
}

impl OAuthSession {
    /// Fails fast on missing consumer credentials or token location.
    pub(crate) fn from_config(config: &Config) -> Result<Self, CliError> {
        let credentials = config.oauth_credentials()?;
        let store = TokenStore::new(config.token_file_path()?);
        let grant = Arc::new(TokenExchanger::new(
            &config.oauth.token_url,
            credentials.clone(),
        ));
        Ok(Self {
            credentials,
            store,
            grant,
        })
    }
}
