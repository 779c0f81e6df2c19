//! Interactive browser login.

use bbcli::auth::{
    diagnose, BrowserLauncher, LoginFlow, LoginProgress, NoBrowser, SystemBrowser,
};
use bbcli::config::Config;
use bbcli::error::CliError;
use bbcli::render::RenderSink;

use crate::app::OAuthSession;

/// Run one login attempt and persist the resulting tokens.
pub(crate) async fn handle_login_command(
    renderer: &dyn RenderSink,
    config: &Config,
    no_browser: bool,
) -> Result<(), CliError> {
    let session = OAuthSession::from_config(config)?;
    let token_path = session.store.path().display().to_string();
    let browser: Box<dyn BrowserLauncher> = if no_browser {
        Box::new(NoBrowser)
    } else {
        Box::new(SystemBrowser)
    };
    let mut flow = LoginFlow::new(
        &config.oauth.auth_url,
        session.credentials.client_id.clone(),
        session.grant,
        session.store,
        browser,
    );

    renderer.section("login");
    let result = flow
        .run_with_progress(|progress| render_progress(renderer, progress))
        .await;

    match result {
        Ok(record) => {
            renderer.success("Authentication successful");
            renderer.field("expires at", &record.expires_at_display());
            if !record.scopes.is_empty() {
                renderer.field("scopes", &record.scopes);
            }
            renderer.field("token file", &token_path);
            Ok(())
        }
        Err(err) => {
            let causes = diagnose(&err);
            if !causes.is_empty() {
                renderer.section("common issues");
                for (index, cause) in causes.iter().enumerate() {
                    renderer.detail(&format!("{}. {}", index + 1, cause.hint(flow.redirect_uri())));
                }
            }
            Err(err.into())
        }
    }
}

fn render_progress(renderer: &dyn RenderSink, progress: &LoginProgress) {
    match progress {
        LoginProgress::AwaitingAuthorization {
            port,
            authorization_url,
            browser_opened,
        } => {
            renderer.field("callback port", &port.to_string());
            renderer.field("url", authorization_url);
            if *browser_opened {
                renderer.field("browser", "opened");
            } else {
                renderer.field("browser", "not opened (visit the URL above)");
            }
            renderer.detail("waiting for authorization in the browser...");
        }
        LoginProgress::Exchanging => {
            renderer.detail("authorization received; exchanging code for tokens");
        }
    }
}
