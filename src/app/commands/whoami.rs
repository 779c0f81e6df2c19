//! Show the account behind the saved login.

use bbcli::api::{current_user, AuthenticatedClient};
use bbcli::config::Config;
use bbcli::error::CliError;
use bbcli::render::RenderSink;

use crate::app::OAuthSession;

pub(crate) async fn handle_whoami_command(
    renderer: &dyn RenderSink,
    config: &Config,
) -> Result<(), CliError> {
    let session = OAuthSession::from_config(config)?;
    let client = AuthenticatedClient::new(&config.api, session.store, session.grant);
    let user = current_user(&client).await?;

    renderer.section("account");
    renderer.field("name", user.label());
    for (key, value) in [
        ("username", &user.username),
        ("account id", &user.account_id),
        ("uuid", &user.uuid),
    ] {
        if !value.is_empty() {
            renderer.field(key, value);
        }
    }
    Ok(())
}
