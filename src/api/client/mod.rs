//! Authenticated HTTP client for the remote REST API.
//!
//! The client facade here stays small:
//! - bearer resolution and refresh are delegated to `auth`.
//! - sending and status classification are delegated to `transport`.

mod auth;
mod transport;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{TokenGrant, TokenStore};
use crate::config::ApiConfig;
use crate::error::ApiError;
use auth::SessionTokens;

/// Client that authorizes every request with the saved login.
///
/// Business calls are not retried.
pub struct AuthenticatedClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionTokens,
}

impl AuthenticatedClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig, store: TokenStore, grant: Arc<dyn TokenGrant>) -> Self {
        Self {
            http: transport::build_http_client(Duration::from_secs(config.timeout_secs.max(1))),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session: SessionTokens::new(store, grant),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/user`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Underlying HTTP client, for building requests passed to [`send`](Self::send).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Authorize and send `request`.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let bearer = self.session.bearer_token().await?;
        transport::dispatch(request, &bearer).await
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path));
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}
