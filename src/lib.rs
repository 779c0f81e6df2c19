//! bbcli: OAuth 2.0 login lifecycle for a Bitbucket Cloud command-line tool.
//!
//! The crate owns the whole credential story: a browser-based
//! authorization-code login with a loopback redirect listener, owner-only
//! token persistence, and an HTTP client that refreshes the saved login
//! transparently before business calls.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bbcli::api::{current_user, AuthenticatedClient};
//! use bbcli::auth::{TokenExchanger, TokenStore};
//! use bbcli::config::{load_config, DefaultCredentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None, Some(&DefaultCredentials::from_build_env()))?;
//! let grant = TokenExchanger::new(&config.oauth.token_url, config.oauth_credentials()?);
//! let store = TokenStore::new(config.token_file_path()?);
//! let client = AuthenticatedClient::new(&config.api, store, Arc::new(grant));
//! let me = current_user(&client).await?;
//! println!("{}", me.label());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod build_info;
pub mod config;
pub mod error;
pub mod render;
#[cfg(test)]
pub mod testsupport;
