//! OAuth 2.0 login lifecycle.
//!
//! - `types`: the persisted [`TokenRecord`] and its expiry predicates.
//! - `store`: owner-only JSON persistence of that record.
//! - `callback`: the loopback listener that captures the authorization redirect.
//! - `exchange`: authorization-code and refresh-token grants.
//! - `login`: the interactive flow tying the pieces together.

mod browser;
mod callback;
mod error;
mod exchange;
mod login;
mod store;
mod types;

pub use browser::{BrowserLauncher, NoBrowser, SystemBrowser};
pub use callback::{classify_callback, CallbackListener, CallbackOutcome, CALLBACK_PATH};
pub use error::AuthError;
pub use exchange::{TokenExchanger, TokenGrant, TOKEN_HTTP_TIMEOUT};
pub use login::{
    build_authorization_url, diagnose, generate_state, LikelyCause, LoginFlow, LoginProgress,
    LoginState, LOGIN_TIMEOUT, REQUIRED_SCOPES,
};
pub use store::TokenStore;
pub use types::{
    format_remaining, unix_now_secs, TokenRecord, DEFAULT_TOKEN_TYPE, EXPIRY_MARGIN_SECS,
    MAX_TOKEN_LIFETIME_SECS,
};
