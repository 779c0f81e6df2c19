//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`BBCLI_CLIENT_ID`, `BBCLI_CLIENT_SECRET`,
//!    `BBCLI_USE_OAUTH`, `BBCLI_API_BASE_URL`, ...)
//! 2. TOML file specified via --config CLI flag
//! 3. ./bbcli.toml in the current directory
//! 4. $XDG_CONFIG_HOME/bbcli/bbcli.toml (or ~/.config/bbcli/bbcli.toml)
//! 5. Default credentials injected by the caller, then built-in defaults

use std::path::PathBuf;

mod defaults;
mod env;
mod loader;
mod types;

pub use loader::load_config;
pub use types::{ApiConfig, ClientCredentials, Config, DefaultCredentials, OAuthConfig};

/// Resolve the base config directory from env/home conventions.
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}
