//! Read-only report on the saved login.

use std::path::Path;

use bbcli::auth::{format_remaining, unix_now_secs, AuthError, TokenRecord, TokenStore};
use bbcli::config::Config;
use bbcli::error::CliError;
use bbcli::render::RenderSink;

/// Report the saved login without refreshing or rewriting anything.
pub(crate) fn handle_status_command(
    renderer: &dyn RenderSink,
    config: &Config,
) -> Result<(), CliError> {
    let path = config.token_file_path()?;
    let loaded = TokenStore::new(&path).load_optional();
    render_status(renderer, config.oauth.use_oauth, &path, loaded, unix_now_secs());
    Ok(())
}

fn render_status(
    renderer: &dyn RenderSink,
    use_oauth: bool,
    path: &Path,
    loaded: Result<Option<TokenRecord>, AuthError>,
    now: i64,
) {
    renderer.section("authentication status");
    if !use_oauth {
        renderer.field("method", "not configured");
        renderer.warn("OAuth is not enabled");
        renderer.detail(
            "Set client_id and client_secret under [oauth] in bbcli.toml (or BBCLI_CLIENT_ID / BBCLI_CLIENT_SECRET), then run `bbcli login`.",
        );
        return;
    }
    renderer.field("method", "OAuth 2.0");

    let record = match loaded {
        Ok(Some(record)) => record,
        Ok(None) => {
            renderer.warn("No OAuth token found");
            renderer.detail("Run `bbcli login` to authenticate.");
            return;
        }
        Err(err) => {
            renderer.warn(&err.to_string());
            return;
        }
    };

    if record.is_usable_at(now) {
        renderer.success("Access token is valid");
    } else if record.needs_refresh_at(now) {
        renderer.warn("Access token has expired");
        renderer.detail("It will be automatically refreshed on the next API call.");
    } else {
        renderer.warn("Saved login is incomplete");
        renderer.detail("Run `bbcli login` to authenticate again.");
    }

    renderer.field("token type", &record.token_type);
    renderer.field("expires at", &record.expires_at_display());
    if let Some(remaining) = record.time_until_expiry_at(now) {
        renderer.field("time until expiry", &format_remaining(remaining));
    }
    if !record.scopes.is_empty() {
        renderer.field("scopes", &record.scopes);
    }
    renderer.field("token file", &path.display().to_string());
}
