//! HTTP transport helpers for authenticated API requests.

use crate::error::ApiError;
use std::time::Duration;

/// Build an HTTP client with timeout applied.
pub(super) fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bbcli/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send one request with `bearer` attached and classify the status.
///
/// A 401 is reported as a rejection of the credential, distinct from other
/// non-2xx statuses.
pub(super) async fn dispatch(
    request: reqwest::RequestBuilder,
    bearer: &str,
) -> Result<reqwest::Response, ApiError> {
    let response = request.bearer_auth(bearer).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        tracing::debug!(%url, "api rejected bearer token");
        return Err(ApiError::AuthenticationRejected(url));
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status(status.as_u16(), body))
}
