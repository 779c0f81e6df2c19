//! Forced token refresh.

use bbcli::auth::{AuthError, TokenGrant};
use bbcli::config::Config;
use bbcli::error::CliError;
use bbcli::render::RenderSink;

use crate::app::OAuthSession;

/// Refresh now, regardless of remaining lifetime, and persist the new record.
pub(crate) async fn handle_refresh_command(
    renderer: &dyn RenderSink,
    config: &Config,
) -> Result<(), CliError> {
    let session = OAuthSession::from_config(config)?;
    let current = session.store.load()?;
    if current.refresh_token.is_empty() {
        return Err(AuthError::Invalid(
            "saved login has no refresh token; run `bbcli login` again".to_string(),
        )
        .into());
    }

    renderer.detail("Refreshing access token...");
    let refreshed = session.grant.refresh(&current).await?;
    session.store.save(&refreshed)?;

    renderer.success("Token refreshed successfully");
    renderer.field("expires at", &refreshed.expires_at_display());
    if refreshed.refresh_token != current.refresh_token {
        tracing::debug!("authority rotated the refresh token");
    }
    Ok(())
}
