//! Auth subsystem error definitions.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Errors surfaced by the login/auth subsystem.
///
/// Every message ends with the next action the user should take.
#[derive(Debug)]
pub enum AuthError {
    /// No token file exists yet.
    NotLoggedIn(PathBuf),
    /// The token file exists but does not parse.
    Corrupt { path: PathBuf, detail: String },
    /// The token file or its directory could not be written or removed.
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The local callback listener failed to bind or accept.
    Listener(std::io::Error),
    /// The authority redirected back with `error` + `error_description`.
    AuthorityDenied { code: String, description: String },
    /// The redirect carried a `state` that does not belong to this attempt.
    StateMismatch,
    /// The redirect carried neither an error nor an authorization code.
    MissingCode,
    /// No redirect arrived within the login window.
    Timeout(Duration),
    /// Network-level failure talking to the authority.
    Http(reqwest::Error),
    /// Non-2xx from the authorization-code grant.
    ExchangeFailed { status: u16, body: String },
    /// Non-2xx from the refresh-token grant.
    RefreshFailed { status: u16, body: String },
    /// The authority answered 2xx with an unusable payload.
    Invalid(String),
}

impl AuthError {
    /// True when the only way forward is running `bbcli login` again.
    pub fn requires_relogin(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn(_)
                | Self::Corrupt { .. }
                | Self::AuthorityDenied { .. }
                | Self::StateMismatch
                | Self::MissingCode
                | Self::Timeout(_)
                | Self::RefreshFailed { .. }
        )
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLoggedIn(path) => write!(
                f,
                "no saved login at `{}`; run `bbcli login` first",
                path.display()
            ),
            Self::Corrupt { path, detail } => write!(
                f,
                "token file `{}` is unreadable ({detail}); run `bbcli logout` then `bbcli login`",
                path.display()
            ),
            Self::Persist { path, source } => write!(
                f,
                "failed to persist tokens at `{}`: {source}; check permissions on that directory",
                path.display()
            ),
            Self::Listener(err) => write!(
                f,
                "local callback listener failed: {err}; re-run `bbcli login`"
            ),
            Self::AuthorityDenied { code, description } => write!(
                f,
                "authorization denied by the authority: {code} - {description}; check the OAuth consumer configuration and re-run `bbcli login`"
            ),
            Self::StateMismatch => write!(
                f,
                "authorization redirect carried an unexpected state parameter (possible CSRF attempt); re-run `bbcli login`"
            ),
            Self::MissingCode => write!(
                f,
                "authorization redirect did not include an authorization code; re-run `bbcli login`"
            ),
            Self::Timeout(after) => write!(
                f,
                "authorization timed out after {} seconds; re-run `bbcli login` and approve access in the browser",
                after.as_secs()
            ),
            Self::Http(err) => write!(
                f,
                "http: {err}; check your network connection and retry"
            ),
            Self::ExchangeFailed { status, body } => write!(
                f,
                "token exchange failed (status {status}): {body}; check the OAuth consumer callback URL and credentials"
            ),
            Self::RefreshFailed { status, body } => write!(
                f,
                "token refresh failed (status {status}): {body}; run `bbcli login` again"
            ),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persist { source, .. } => Some(source),
            Self::Listener(err) => Some(err),
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
