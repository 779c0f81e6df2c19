//! Shared fixtures for end-to-end OAuth lifecycle tests.
//!
//! The scratch directory and scripted HTTP server come from the crate's own
//! `testsupport` module; the browser stand-ins play the user by following
//! the authorization URL straight back to the loopback redirect.

#![allow(dead_code)]

#[path = "../../src/testsupport.rs"]
mod fixtures;

pub use fixtures::{MockHttpServer, MockResponse, TestTempDir};

use bbcli::auth::BrowserLauncher;

/// Browser stand-in that immediately hits the redirect URI.
pub struct ScriptedBrowser {
    /// Builds the redirect query from the attempt's real `state`.
    pub query: fn(&str) -> String,
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> bool {
        let parsed = url::Url::parse(url).expect("authorization url");
        let param = |name: &str| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        };
        let target = format!("{}?{}", param("redirect_uri"), (self.query)(&param("state")));
        tokio::spawn(async move {
            let _ = reqwest::get(target).await;
        });
        true
    }
}

/// Browser stand-in for a user who never comes back.
pub struct AbandonedBrowser;

impl BrowserLauncher for AbandonedBrowser {
    fn open(&self, _url: &str) -> bool {
        false
    }
}
