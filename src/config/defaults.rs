//! Default configuration constants.

/// Credential authority authorization page.
pub(super) const DEFAULT_AUTH_URL: &str = "https://bitbucket.org/site/oauth2/authorize";
/// Credential authority token endpoint (code exchange and refresh).
pub(super) const DEFAULT_TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";
/// REST API base used by authenticated calls.
pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.bitbucket.org/2.0";
/// Default timeout for authenticated API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
/// Directory under the config root holding config and tokens.
pub(super) const APP_DIR_NAME: &str = "bbcli";
/// Config file name, both in the working directory and under the config root.
pub(super) const CONFIG_FILE_NAME: &str = "bbcli.toml";
/// Token record file name under the config root.
pub(super) const TOKEN_FILE_NAME: &str = "tokens.json";
