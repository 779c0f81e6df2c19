//! Environment overrides.
//!
//! `BBCLI_*` variables take precedence over config file values. They are
//! applied to the parsed file model so an explicit `BBCLI_USE_OAUTH` counts
//! as explicitly configured.

use crate::error::ConfigError;

use super::types::FileConfig;

pub(super) fn apply_env_overrides<FEnv>(
    file: &mut FileConfig,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(value) = non_empty(env_lookup, "BBCLI_CLIENT_ID") {
        file.oauth.client_id = Some(value);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_CLIENT_SECRET") {
        file.oauth.client_secret = Some(value);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_USE_OAUTH") {
        file.oauth.use_oauth = Some(parse_bool("BBCLI_USE_OAUTH", &value)?);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_AUTH_URL") {
        file.oauth.auth_url = Some(value);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_TOKEN_URL") {
        file.oauth.token_url = Some(value);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_API_BASE_URL") {
        file.api.base_url = Some(value);
    }
    if let Some(value) = non_empty(env_lookup, "BBCLI_API_TIMEOUT_SECS") {
        let parsed = value.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid BBCLI_API_TIMEOUT_SECS value `{value}`: expected positive integer seconds"
            ))
        })?;
        // Clamp to at least 1 second to avoid accidental "no timeout".
        file.api.timeout_secs = Some(parsed.max(1));
    }
    Ok(())
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "invalid {name} value `{value}`: expected true or false"
        ))),
    }
}
