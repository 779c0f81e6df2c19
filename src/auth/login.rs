//! Browser-based authorization-code login.
//!
//! One [`LoginFlow::run`] call is one attempt: fresh CSRF state, fresh
//! loopback listener, one bounded wait, then code exchange and persistence.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

use super::browser::BrowserLauncher;
use super::callback::CallbackListener;
use super::error::AuthError;
use super::exchange::TokenGrant;
use super::store::TokenStore;
use super::types::TokenRecord;

/// How long the user has to approve access in the browser.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Capability scopes requested on every login.
pub const REQUIRED_SCOPES: &[&str] = &[
    "account",
    "repository",
    "pullrequest",
    "pullrequest:write",
    "pipeline",
    "pipeline:write",
    "pipeline:variable",
    "webhook",
];

const STATE_BYTES: usize = 32;

/// Where a login attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    AwaitingUserAuthorization,
    Exchanging,
    Authenticated,
    Failed,
}

/// Progress notifications for the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginProgress {
    AwaitingAuthorization {
        port: u16,
        authorization_url: String,
        browser_opened: bool,
    },
    Exchanging,
}

/// Orchestrates one interactive login against a credential authority.
pub struct LoginFlow {
    auth_url: String,
    client_id: String,
    scopes: Vec<String>,
    grant: Arc<dyn TokenGrant>,
    store: TokenStore,
    browser: Box<dyn BrowserLauncher>,
    timeout: Duration,
    state: LoginState,
    redirect_uri: Option<String>,
}

impl LoginFlow {
    pub fn new(
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        grant: Arc<dyn TokenGrant>,
        store: TokenStore,
        browser: Box<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            scopes: REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect(),
            grant,
            store,
            browser,
            timeout: LOGIN_TIMEOUT,
            state: LoginState::Idle,
            redirect_uri: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Redirect URI of the most recent attempt, once its listener was bound.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    pub async fn run(&mut self) -> Result<TokenRecord, AuthError> {
        self.run_with_progress(|_| {}).await
    }

    /// Run one attempt, reporting progress through `on_progress`.
    ///
    /// The callback listener is stopped before this returns on every path.
    pub async fn run_with_progress<F>(&mut self, mut on_progress: F) -> Result<TokenRecord, AuthError>
    where
        F: FnMut(&LoginProgress),
    {
        self.state = LoginState::Idle;
        self.redirect_uri = None;
        let result = self.attempt(&mut on_progress).await;
        self.state = match &result {
            Ok(_) => LoginState::Authenticated,
            Err(err) => {
                tracing::debug!(error = %err, "login attempt failed");
                LoginState::Failed
            }
        };
        result
    }

    async fn attempt<F>(&mut self, on_progress: &mut F) -> Result<TokenRecord, AuthError>
    where
        F: FnMut(&LoginProgress),
    {
        let csrf_state = generate_state();
        let mut listener = CallbackListener::bind(csrf_state.clone()).await?;
        let redirect_uri = listener.redirect_uri();
        self.redirect_uri = Some(redirect_uri.clone());

        let code = self
            .await_code(&mut listener, &csrf_state, &redirect_uri, on_progress)
            .await;
        listener.shutdown().await;
        let code = code?;

        self.state = LoginState::Exchanging;
        on_progress(&LoginProgress::Exchanging);
        let record = self.grant.exchange_code(&code, &redirect_uri).await?;
        self.store.save(&record)?;
        tracing::info!(scopes = %record.scopes, "login complete");
        Ok(record)
    }

    async fn await_code<F>(
        &mut self,
        listener: &mut CallbackListener,
        csrf_state: &str,
        redirect_uri: &str,
        on_progress: &mut F,
    ) -> Result<String, AuthError>
    where
        F: FnMut(&LoginProgress),
    {
        let authorization_url = build_authorization_url(
            &self.auth_url,
            &self.client_id,
            csrf_state,
            &self.scopes,
            redirect_uri,
        )?;
        self.state = LoginState::AwaitingUserAuthorization;
        let browser_opened = self.browser.open(&authorization_url);
        on_progress(&LoginProgress::AwaitingAuthorization {
            port: listener.port(),
            authorization_url,
            browser_opened,
        });
        listener.wait(self.timeout).await
    }
}

/// Fresh 256-bit CSRF token, base64url without padding.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Authorization endpoint URL for one attempt.
pub fn build_authorization_url(
    auth_url: &str,
    client_id: &str,
    state: &str,
    scopes: &[String],
    redirect_uri: &str,
) -> Result<String, AuthError> {
    let scope = scopes.join(" ");
    let url = url::Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("state", state),
            ("scope", scope.as_str()),
            ("redirect_uri", redirect_uri),
        ],
    )
    .map_err(|err| AuthError::Invalid(format!("invalid authorization URL `{auth_url}`: {err}")))?;
    Ok(url.into())
}

/// The consumer misconfigurations that explain most failed logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikelyCause {
    RedirectUriMismatch,
    InvalidClientCredentials,
    MissingScopes,
}

impl LikelyCause {
    /// One actionable line; `redirect_uri` is the URL the consumer must allow.
    pub fn hint(&self, redirect_uri: Option<&str>) -> String {
        match self {
            Self::RedirectUriMismatch => match redirect_uri {
                Some(uri) => format!(
                    "Callback URL mismatch: the OAuth consumer must allow {uri} (any localhost port)"
                ),
                None => "Callback URL mismatch: check the OAuth consumer callback URL".to_string(),
            },
            Self::InvalidClientCredentials => {
                "Invalid client credentials: verify client_id and client_secret".to_string()
            }
            Self::MissingScopes => format!(
                "Missing permissions: grant the consumer these scopes: {}",
                REQUIRED_SCOPES.join(", ")
            ),
        }
    }
}

/// Most likely causes for a failed login, most likely first.
pub fn diagnose(err: &AuthError) -> Vec<LikelyCause> {
    use LikelyCause::*;
    match err {
        AuthError::AuthorityDenied { code, .. } => match code.as_str() {
            "redirect_uri_mismatch" | "invalid_request" => vec![RedirectUriMismatch],
            "invalid_client" | "unauthorized_client" => vec![InvalidClientCredentials],
            "invalid_scope" => vec![MissingScopes],
            _ => vec![RedirectUriMismatch, InvalidClientCredentials, MissingScopes],
        },
        AuthError::ExchangeFailed { status, body } => {
            if *status == 401 || body.contains("invalid_client") || body.contains("unauthorized_client") {
                vec![InvalidClientCredentials]
            } else if body.contains("redirect_uri") || body.contains("invalid_grant") {
                vec![RedirectUriMismatch, InvalidClientCredentials]
            } else {
                vec![RedirectUriMismatch, InvalidClientCredentials, MissingScopes]
            }
        }
        AuthError::MissingCode => vec![RedirectUriMismatch, MissingScopes],
        AuthError::Timeout(_) => vec![RedirectUriMismatch],
        _ => Vec::new(),
    }
}
