//! Bearer resolution for API requests, refreshing the saved login as needed.
//!
//! Kept apart from dispatch so token behavior can be tested without a
//! business endpoint.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::{unix_now_secs, AuthError, TokenGrant, TokenRecord, TokenStore};
use crate::error::ApiError;

/// The current process's view of the saved login.
pub(super) struct SessionTokens {
    store: TokenStore,
    grant: Arc<dyn TokenGrant>,
    cached: Mutex<Option<TokenRecord>>,
}

impl SessionTokens {
    pub(super) fn new(store: TokenStore, grant: Arc<dyn TokenGrant>) -> Self {
        Self {
            store,
            grant,
            cached: Mutex::new(None),
        }
    }

    /// Access token to attach to the next request.
    ///
    /// Loads once per process, refreshes inside the expiry margin, and never
    /// hands out a stale token.
    pub(super) async fn bearer_token(&self) -> Result<String, ApiError> {
        let mut cached = self.cached.lock().await;
        let record = match cached.take() {
            Some(record) => record,
            None => self.store.load().map_err(login_required)?,
        };

        let now = unix_now_secs();
        if record.is_usable_at(now) {
            let token = record.access_token.clone();
            *cached = Some(record);
            return Ok(token);
        }
        if !record.needs_refresh_at(now) {
            return Err(ApiError::LoginRequired(format!(
                "saved login at `{}` is incomplete; run `bbcli login` again",
                self.store.path().display()
            )));
        }

        tracing::debug!(expires_at = record.expires_at_unix, "access token expiring, refreshing");
        let refreshed = self.grant.refresh(&record).await.map_err(|err| {
            if err.requires_relogin() {
                ApiError::LoginRequired(err.to_string())
            } else {
                ApiError::LoginRequired(format!(
                    "failed to refresh saved login: {err}; if this persists run `bbcli login` again"
                ))
            }
        })?;
        self.store.save(&refreshed).map_err(|err| {
            ApiError::LoginRequired(format!("failed to persist refreshed login: {err}"))
        })?;

        let token = refreshed.access_token.clone();
        *cached = Some(refreshed);
        Ok(token)
    }
}

fn login_required(err: AuthError) -> ApiError {
    ApiError::LoginRequired(err.to_string())
}
