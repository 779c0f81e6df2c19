//! End-to-end OAuth lifecycle against a scripted authority on loopback.

mod oauth_flow;

use std::sync::Arc;
use std::time::Duration;

use bbcli::api::AuthenticatedClient;
use bbcli::auth::{
    unix_now_secs, AuthError, LoginFlow, LoginState, TokenExchanger, TokenRecord, TokenStore,
};
use bbcli::config::{ApiConfig, ClientCredentials};
use oauth_flow::{AbandonedBrowser, MockHttpServer, MockResponse, ScriptedBrowser, TestTempDir};

const AUTHORIZE_URL: &str = "https://bitbucket.example/site/oauth2/authorize";
const TOKEN_PATH: &str = "/site/oauth2/access_token";

fn credentials() -> ClientCredentials {
    ClientCredentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
    }
}

fn login_flow(
    authority: &MockHttpServer,
    store: TokenStore,
    browser: Box<dyn bbcli::auth::BrowserLauncher>,
) -> LoginFlow {
    let grant = TokenExchanger::new(authority.url(TOKEN_PATH), credentials());
    LoginFlow::new(AUTHORIZE_URL, "client-id", Arc::new(grant), store, browser)
        .with_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn browser_login_exchanges_code_and_persists_tokens() {
    let dir = TestTempDir::new("login-ok");
    let store = TokenStore::new(dir.child("nested/tokens.json"));
    let authority = MockHttpServer::start(vec![MockResponse::json(
        200,
        r#"{"access_token":"acc-1","refresh_token":"ref-1","expires_in":7200,"token_type":"bearer","scopes":"account repository"}"#,
    )])
    .await;
    let browser = ScriptedBrowser {
        query: |state| format!("code=auth-code-42&state={state}"),
    };

    let mut flow = login_flow(&authority, store.clone(), Box::new(browser));
    let record = flow.run().await.expect("login succeeds");

    assert_eq!(flow.state(), LoginState::Authenticated);
    assert_eq!(record.access_token, "acc-1");
    assert_eq!(record.scopes, "account repository");
    assert!(record.expires_at_unix >= unix_now_secs() + 7000);
    assert_eq!(store.load().expect("persisted"), record);

    let requests = authority.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, TOKEN_PATH);
    assert_eq!(
        requests[0].form_value("grant_type").as_deref(),
        Some("authorization_code")
    );
    assert_eq!(requests[0].form_value("code").as_deref(), Some("auth-code-42"));
    let redirect = requests[0]
        .form_value("redirect_uri")
        .expect("redirect_uri sent");
    assert_eq!(Some(redirect.as_str()), flow.redirect_uri());
    assert!(redirect.starts_with("http://localhost:"));
    assert!(redirect.ends_with("/callback"));
}

#[tokio::test]
async fn access_denied_is_reported_verbatim_and_nothing_is_saved() {
    let dir = TestTempDir::new("login-denied");
    let store = TokenStore::new(dir.child("tokens.json"));
    let authority = MockHttpServer::start(Vec::new()).await;
    let browser = ScriptedBrowser {
        query: |state| {
            format!("error=access_denied&error_description=User+denied+access&state={state}")
        },
    };

    let mut flow = login_flow(&authority, store.clone(), Box::new(browser));
    let err = flow.run().await.expect_err("denied");

    match err {
        AuthError::AuthorityDenied { code, description } => {
            assert_eq!(code, "access_denied");
            assert_eq!(description, "User denied access");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(flow.state(), LoginState::Failed);
    assert!(authority.requests().is_empty(), "no exchange after a denial");
    assert!(!store.path().exists());
}

#[tokio::test]
async fn forged_state_is_rejected_without_exchange() {
    let dir = TestTempDir::new("login-csrf");
    let store = TokenStore::new(dir.child("tokens.json"));
    let authority = MockHttpServer::start(Vec::new()).await;
    let browser = ScriptedBrowser {
        query: |_| "code=stolen&state=forged".to_string(),
    };

    let mut flow = login_flow(&authority, store.clone(), Box::new(browser));
    let err = flow.run().await.expect_err("state mismatch");

    assert!(matches!(err, AuthError::StateMismatch), "got: {err}");
    assert!(authority.requests().is_empty());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn abandoned_login_times_out_and_releases_the_port() {
    let dir = TestTempDir::new("login-timeout");
    let store = TokenStore::new(dir.child("tokens.json"));
    let authority = MockHttpServer::start(Vec::new()).await;

    let mut flow = login_flow(&authority, store, Box::new(AbandonedBrowser))
        .with_timeout(Duration::from_millis(200));
    let err = flow.run().await.expect_err("timeout");
    assert!(matches!(err, AuthError::Timeout(_)), "got: {err}");

    let redirect = flow.redirect_uri().expect("listener was bound").to_string();
    let port = url::Url::parse(&redirect)
        .expect("redirect uri")
        .port()
        .expect("explicit port");
    let rebound = tokio::net::TcpListener::bind(("127.0.0.1", port)).await;
    assert!(rebound.is_ok(), "port {port} still held after timeout");
}

#[tokio::test]
async fn rejected_exchange_keeps_previous_login() {
    let dir = TestTempDir::new("login-exchange-401");
    let store = TokenStore::new(dir.child("tokens.json"));
    let previous = TokenRecord {
        access_token: "old-access".into(),
        refresh_token: "old-refresh".into(),
        expires_at_unix: unix_now_secs() + 3600,
        token_type: "bearer".into(),
        scopes: String::new(),
    };
    store.save(&previous).expect("seed");
    let authority = MockHttpServer::start(vec![MockResponse::json(401, r#"{"error":"invalid_client"}"#)]).await;
    let browser = ScriptedBrowser {
        query: |state| format!("code=c&state={state}"),
    };

    let mut flow = login_flow(&authority, store.clone(), Box::new(browser));
    let err = flow.run().await.expect_err("exchange rejected");

    assert!(
        matches!(err, AuthError::ExchangeFailed { status: 401, .. }),
        "got: {err}"
    );
    assert_eq!(store.load().expect("still there"), previous);
}

#[tokio::test]
async fn expiring_login_is_refreshed_before_the_api_call() {
    let dir = TestTempDir::new("gateway-refresh");
    let store = TokenStore::new(dir.child("tokens.json"));
    store
        .save(&TokenRecord {
            access_token: "stale".into(),
            refresh_token: "ref-old".into(),
            expires_at_unix: unix_now_secs() + 120,
            token_type: "bearer".into(),
            scopes: "account".into(),
        })
        .expect("seed");

    let authority = MockHttpServer::start(vec![MockResponse::json(
        200,
        r#"{"access_token":"rotated","refresh_token":"ref-new","expires_in":3600}"#,
    )])
    .await;
    let api = MockHttpServer::start(vec![MockResponse::json(200, r#"{"username":"octo"}"#)]).await;
    let grant = TokenExchanger::new(authority.url(TOKEN_PATH), credentials());
    let config = ApiConfig {
        base_url: api.base_url().to_string(),
        timeout_secs: 5,
    };
    let client = AuthenticatedClient::new(&config, store.clone(), Arc::new(grant));

    let body: serde_json::Value = client.get_json("/user").await.expect("api call");
    assert_eq!(body["username"], "octo");

    let requests = authority.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].form_value("grant_type").as_deref(),
        Some("refresh_token")
    );
    assert_eq!(
        requests[0].form_value("refresh_token").as_deref(),
        Some("ref-old")
    );
    assert_eq!(
        api.requests()[0].header("authorization"),
        Some("Bearer rotated")
    );

    let saved = store.load().expect("rotated record");
    assert_eq!(saved.access_token, "rotated");
    assert_eq!(saved.refresh_token, "ref-new");
    assert_eq!(saved.scopes, "account", "scopes kept when the grant omits them");
}
