//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{APP_DIR_NAME, CONFIG_FILE_NAME, TOKEN_FILE_NAME};
use super::env::apply_env_overrides;
use super::types::{ApiConfig, Config, DefaultCredentials, FileConfig, OAuthConfig};
use super::config_root_dir;

/// Where the config text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ConfigSource {
    Explicit(PathBuf),
    Local,
    Global(PathBuf),
    BuiltInDefaults,
}

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
/// `defaults` fills consumer credentials left empty by every other source.
pub fn load_config(
    path_override: Option<&str>,
    defaults: Option<&DefaultCredentials>,
) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        defaults,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    defaults: Option<&DefaultCredentials>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) = read_config_text(path_override, &read_file, &config_root)?;
    tracing::debug!(?source, "resolved config source");

    let mut file: FileConfig = toml::from_str(&config_text)?;
    apply_env_overrides(&mut file, &env_lookup)?;

    let token_file = config_root().map(|dir| dir.join(APP_DIR_NAME).join(TOKEN_FILE_NAME));
    Ok(resolve_config(file, defaults, token_file))
}

fn read_config_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, ConfigSource::Explicit(path)));
    }

    if let Ok(text) = read_file(Path::new(CONFIG_FILE_NAME)) {
        return Ok((text, ConfigSource::Local));
    }
    if let Some(dir) = config_root() {
        let global = dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if let Ok(text) = read_file(&global) {
            return Ok((text, ConfigSource::Global(global)));
        }
    }

    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

fn resolve_config(
    file: FileConfig,
    defaults: Option<&DefaultCredentials>,
    token_file: Option<PathBuf>,
) -> Config {
    let base_oauth = OAuthConfig::default();
    let base_api = ApiConfig::default();

    let mut client_id = file.oauth.client_id.unwrap_or_default().trim().to_string();
    let mut client_secret = file
        .oauth
        .client_secret
        .unwrap_or_default()
        .trim()
        .to_string();
    if let Some(defaults) = defaults {
        if client_id.is_empty() {
            client_id = defaults.client_id.trim().to_string();
        }
        if client_secret.is_empty() {
            client_secret = defaults.client_secret.trim().to_string();
        }
    }

    // OAuth is on by default only when a complete consumer is available.
    let use_oauth = file
        .oauth
        .use_oauth
        .unwrap_or(!client_id.is_empty() && !client_secret.is_empty());

    Config {
        oauth: OAuthConfig {
            client_id,
            client_secret,
            use_oauth,
            auth_url: file.oauth.auth_url.unwrap_or(base_oauth.auth_url),
            token_url: file.oauth.token_url.unwrap_or(base_oauth.token_url),
        },
        api: ApiConfig {
            base_url: file
                .api
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(base_api.base_url),
            timeout_secs: file.api.timeout_secs.unwrap_or(base_api.timeout_secs).max(1),
        },
        token_file,
    }
}
