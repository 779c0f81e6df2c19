//! Delete the saved login.

use bbcli::auth::TokenStore;
use bbcli::config::Config;
use bbcli::error::CliError;
use bbcli::render::RenderSink;

/// Clear saved tokens. Running it with nothing saved is not an error.
pub(crate) fn handle_logout_command(
    renderer: &dyn RenderSink,
    config: &Config,
) -> Result<(), CliError> {
    let store = TokenStore::new(config.token_file_path()?);
    if store.clear()? {
        renderer.success("Logged out successfully");
        renderer.detail("OAuth tokens have been cleared.");
    } else {
        renderer.detail("No saved login found; nothing to clear.");
    }
    renderer.detail("Run `bbcli login` to authenticate again.");
    Ok(())
}
