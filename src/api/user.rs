//! `GET /user`: the account the saved login belongs to.

use serde::Deserialize;

use super::client::AuthenticatedClient;
use crate::error::ApiError;

/// Subset of the account payload the CLI shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub account_id: String,
}

impl CurrentUser {
    /// Best human-facing name available.
    pub fn label(&self) -> &str {
        [&self.display_name, &self.username, &self.uuid]
            .into_iter()
            .find(|value| !value.is_empty())
            .map(String::as_str)
            .unwrap_or("(unknown)")
    }
}

pub async fn current_user(client: &AuthenticatedClient) -> Result<CurrentUser, ApiError> {
    client.get_json("/user").await
}
