//! Public auth model types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Tokens are treated as expired this long before their literal expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 5 * 60;

/// Longest access-token lifetime accepted from the authority.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Last second `httpdate` can render (9999-12-31T23:59:59Z).
const MAX_HTTP_DATE_UNIX: i64 = 253_402_300_799;

/// Bearer scheme used when the authority omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// The persisted credential state for one installation.
///
/// Replaced wholesale on every refresh; never merged field by field.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry in unix seconds, computed locally at issue time.
    ///
    /// Also read as an RFC 3339 string, the form older tool versions wrote.
    #[serde(rename = "expires_at", deserialize_with = "deserialize_expires_at")]
    pub expires_at_unix: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Space-delimited scopes as granted by the authority.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scopes: String,
}

impl TokenRecord {
    /// Build a record from a token response received at `issued_at_unix`.
    ///
    /// The lifetime is clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn issued_at(
        issued_at_unix: i64,
        access_token: String,
        refresh_token: String,
        expires_in_secs: i64,
        token_type: String,
        scopes: String,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at_unix: issued_at_unix
                .saturating_add(expires_in_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS)),
            token_type,
            scopes,
        }
    }

    /// True when both secrets are present.
    pub fn has_tokens(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Expired at `now`, including the safety margin.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now.saturating_add(EXPIRY_MARGIN_SECS) >= self.expires_at_unix
    }

    pub fn is_usable_at(&self, now: i64) -> bool {
        self.has_tokens() && !self.is_expired_at(now)
    }

    pub fn needs_refresh_at(&self, now: i64) -> bool {
        self.has_tokens() && self.is_expired_at(now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now_secs())
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(unix_now_secs())
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(unix_now_secs())
    }

    /// Literal (margin-free) expiry as a `SystemTime`.
    pub fn expires_at(&self) -> SystemTime {
        let secs = self.expires_at_unix.clamp(0, MAX_HTTP_DATE_UNIX) as u64;
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    /// Expiry rendered as an RFC 1123 date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
    ///
    /// Falls back to raw unix seconds past what an HTTP date can express.
    pub fn expires_at_display(&self) -> String {
        if (0..=MAX_HTTP_DATE_UNIX).contains(&self.expires_at_unix) {
            httpdate::fmt_http_date(self.expires_at())
        } else {
            format!("unix time {}", self.expires_at_unix)
        }
    }

    /// Time left until the literal expiry, `None` once it has passed.
    pub fn time_until_expiry_at(&self, now: i64) -> Option<Duration> {
        let remaining = self.expires_at_unix.saturating_sub(now);
        (remaining > 0).then(|| Duration::from_secs(remaining as u64))
    }

    /// Individual granted scopes.
    pub fn scope_list(&self) -> Vec<&str> {
        self.scopes.split_whitespace().collect()
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs and panic messages.
        f.debug_struct("TokenRecord")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at_unix", &self.expires_at_unix)
            .field("token_type", &self.token_type)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

fn deserialize_expires_at<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Unix(i64),
        Rfc3339(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Unix(secs) => Ok(secs),
        Raw::Rfc3339(text) => chrono::DateTime::parse_from_rfc3339(text.trim())
            .map(|at| at.timestamp())
            .map_err(|err| serde::de::Error::custom(format!("invalid expires_at `{text}`: {err}"))),
    }
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

/// Render a remaining duration rounded to whole minutes (`1h 05m`, `42m`).
pub fn format_remaining(remaining: Duration) -> String {
    let minutes = (remaining.as_secs() + 30) / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{hours}h {:02}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// Current wall-clock time in unix seconds.
pub fn unix_now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
