//! Token endpoint client: authorization-code and refresh-token grants.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::error::AuthError;
use super::types::{unix_now_secs, TokenRecord, DEFAULT_TOKEN_TYPE};
use crate::config::ClientCredentials;

/// Shared HTTP timeout for token endpoint requests.
pub const TOKEN_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifetime assumed when the authority omits `expires_in`.
const FALLBACK_EXPIRES_IN_SECS: i64 = 3600;

/// The two grants the auth lifecycle needs from a credential authority.
#[async_trait]
pub trait TokenGrant: Send + Sync {
    /// Trade an authorization code for a fresh record.
    async fn exchange_code(&self, code: &str, redirect_uri: &str)
        -> Result<TokenRecord, AuthError>;

    /// Trade `current.refresh_token` for a replacement record.
    ///
    /// When the authority does not rotate the refresh token, the current one
    /// is carried over.
    async fn refresh(&self, current: &TokenRecord) -> Result<TokenRecord, AuthError>;
}

/// Token endpoint response shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    /// May be omitted on refresh.
    refresh_token: Option<String>,
    #[serde(deserialize_with = "deserialize_i64_option", default)]
    expires_in: Option<i64>,
    token_type: Option<String>,
    #[serde(alias = "scope")]
    scopes: Option<String>,
}

impl TokenResponse {
    fn into_record(
        self,
        issued_at: i64,
        previous: Option<&TokenRecord>,
        grant: &str,
    ) -> Result<TokenRecord, AuthError> {
        let access_token = self.access_token.unwrap_or_default().trim().to_string();
        if access_token.is_empty() {
            return Err(AuthError::Invalid(format!(
                "{grant} response did not include access_token"
            )));
        }

        let refresh_token = match self.refresh_token {
            Some(value) => value.trim().to_string(),
            None => previous.map(|p| p.refresh_token.clone()).unwrap_or_default(),
        };
        if refresh_token.is_empty() {
            return Err(AuthError::Invalid(format!(
                "{grant} response did not include refresh_token"
            )));
        }

        let expires_in = match self.expires_in {
            Some(value) => value,
            None => {
                tracing::warn!(
                    fallback_secs = FALLBACK_EXPIRES_IN_SECS,
                    "token response omitted expires_in"
                );
                FALLBACK_EXPIRES_IN_SECS
            }
        };
        let token_type = self
            .token_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());

        let scopes = match self.scopes {
            Some(scopes) => scopes.trim().to_string(),
            None => previous.map(|p| p.scopes.clone()).unwrap_or_default(),
        };

        Ok(TokenRecord::issued_at(
            issued_at,
            access_token,
            refresh_token,
            expires_in,
            token_type,
            scopes,
        ))
    }
}

/// Confidential-client token endpoint adapter.
///
/// Authenticates with HTTP Basic and posts form-encoded grants.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
}

impl TokenExchanger {
    pub fn new(token_url: impl Into<String>, credentials: ClientCredentials) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_HTTP_TIMEOUT)
            .user_agent(concat!("bbcli/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(http, token_url, credentials)
    }

    pub fn with_client(
        http: reqwest::Client,
        token_url: impl Into<String>,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn post_grant(&self, form: &[(&str, &str)]) -> Result<reqwest::Response, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(form)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl TokenGrant for TokenExchanger {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        tracing::debug!(url = %self.token_url, "exchanging authorization code");
        let response = self.post_grant(&form).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(AuthError::ExchangeFailed { status, body });
        }
        parse_token_response(&body)?.into_record(unix_now_secs(), None, "token exchange")
    }

    async fn refresh(&self, current: &TokenRecord) -> Result<TokenRecord, AuthError> {
        if current.refresh_token.is_empty() {
            return Err(AuthError::Invalid(
                "no refresh token saved; run `bbcli login` again".to_string(),
            ));
        }
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
        ];
        tracing::debug!(url = %self.token_url, "refreshing access token");
        let response = self.post_grant(&form).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(AuthError::RefreshFailed { status, body });
        }
        parse_token_response(&body)?.into_record(
            unix_now_secs(),
            Some(current),
            "token refresh",
        )
    }
}

fn parse_token_response(body: &str) -> Result<TokenResponse, AuthError> {
    serde_json::from_str(body).map_err(|err| {
        AuthError::Invalid(format!("failed to parse token endpoint response: {err}"))
    })
}

/// Deserialize optional integer durations encoded as string/number/null.
fn deserialize_i64_option<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(num) => num
            .as_i64()
            .or_else(|| num.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("expires_in must be an integer"))
            .map(Some),
        serde_json::Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid expires_in: {err}"))),
        _ => Err(serde::de::Error::custom(
            "expires_in must be string, number, or null",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{MockHttpServer, MockResponse};

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
        }
    }

    fn current() -> TokenRecord {
        TokenRecord {
            access_token: "old-access".into(),
            refresh_token: "old-refresh".into(),
            expires_at_unix: 1,
            token_type: "bearer".into(),
            scopes: "account".into(),
        }
    }

    #[tokio::test]
    async fn code_exchange_posts_basic_auth_form() {
        let server = MockHttpServer::start(vec![MockResponse::json(
            200,
            r#"{"access_token":"A1","refresh_token":"R1","expires_in":7200,"token_type":"bearer","scopes":"account repository"}"#,
        )])
        .await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());

        let before = unix_now_secs();
        let record = exchanger
            .exchange_code("the-code", "http://localhost:4242/callback")
            .await
            .expect("exchange");
        assert_eq!(record.access_token, "A1");
        assert_eq!(record.refresh_token, "R1");
        assert_eq!(record.scopes, "account repository");
        assert!(record.expires_at_unix >= before + 7200);
        assert!(record.is_usable());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/token");
        // base64("client-id:client-secret")
        assert_eq!(
            request.header("authorization"),
            Some("Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=")
        );
        assert_eq!(
            request.form_value("grant_type").as_deref(),
            Some("authorization_code")
        );
        assert_eq!(request.form_value("code").as_deref(), Some("the-code"));
        assert_eq!(
            request.form_value("redirect_uri").as_deref(),
            Some("http://localhost:4242/callback")
        );
    }

    #[tokio::test]
    async fn code_exchange_error_keeps_status_and_body() {
        let server =
            MockHttpServer::start(vec![MockResponse::json(400, r#"{"error":"invalid_grant"}"#)])
                .await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());
        let err = exchanger
            .exchange_code("bad", "http://localhost:1/callback")
            .await
            .expect_err("rejected");
        match &err {
            AuthError::ExchangeFailed { status, body } => {
                assert_eq!(*status, 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("status 400"), "got: {err}");
    }

    #[tokio::test]
    async fn code_exchange_without_refresh_token_is_invalid() {
        let server = MockHttpServer::start(vec![MockResponse::json(
            200,
            r#"{"access_token":"A1","expires_in":3600}"#,
        )])
        .await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());
        let err = exchanger
            .exchange_code("c", "http://localhost:1/callback")
            .await
            .expect_err("missing refresh");
        assert!(err.to_string().contains("refresh_token"), "got: {err}");
    }

    #[tokio::test]
    async fn refresh_uses_rotated_refresh_token_when_returned() {
        let server = MockHttpServer::start(vec![MockResponse::json(
            200,
            r#"{"access_token":"A2","refresh_token":"R2","expires_in":"3600"}"#,
        )])
        .await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());
        let record = exchanger.refresh(&current()).await.expect("refresh");
        assert_eq!(record.access_token, "A2");
        assert_eq!(record.refresh_token, "R2");
        assert_eq!(record.token_type, "bearer");

        let request = &server.requests()[0];
        assert_eq!(
            request.form_value("grant_type").as_deref(),
            Some("refresh_token")
        );
        assert_eq!(
            request.form_value("refresh_token").as_deref(),
            Some("old-refresh")
        );
    }

    #[tokio::test]
    async fn refresh_keeps_previous_refresh_token_when_omitted() {
        let server = MockHttpServer::start(vec![MockResponse::json(
            200,
            r#"{"access_token":"A2","expires_in":3600,"scope":"account"}"#,
        )])
        .await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());
        let record = exchanger.refresh(&current()).await.expect("refresh");
        assert_eq!(record.refresh_token, "old-refresh");
        assert_eq!(record.scopes, "account");
    }

    #[tokio::test]
    async fn refresh_rejection_is_refresh_failed() {
        let server =
            MockHttpServer::start(vec![MockResponse::json(401, r#"{"error":"revoked"}"#)]).await;
        let exchanger = TokenExchanger::new(server.url("/token"), credentials());
        let err = exchanger.refresh(&current()).await.expect_err("rejected");
        assert!(
            matches!(err, AuthError::RefreshFailed { status: 401, .. }),
            "got: {err}"
        );
        assert!(err.requires_relogin());
    }

    #[test]
    fn missing_expires_in_falls_back_to_one_hour() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r"}"#).expect("parse");
        let record = response
            .into_record(1_000, None, "token exchange")
            .expect("record");
        assert_eq!(record.expires_at_unix, 1_000 + FALLBACK_EXPIRES_IN_SECS);
    }

    #[test]
    fn refresh_without_scopes_keeps_granted_scopes() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":60}"#).expect("parse");
        let record = response
            .into_record(1_000, Some(&current()), "token refresh")
            .expect("record");
        assert_eq!(record.scopes, current().scopes);
        assert_eq!(record.refresh_token, "old-refresh");
    }

    #[test]
    fn malformed_body_is_invalid() {
        let err = parse_token_response("<html>").expect_err("not json");
        assert!(matches!(err, AuthError::Invalid(_)));
    }
}
