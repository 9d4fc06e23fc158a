//! OAuth token triple and token endpoint request bodies
//!
//! Strava's token endpoint handles both grants at `POST /oauth/token` with a
//! JSON body. Responses carry `expires_at` as absolute unix seconds, so the
//! `TokenSet` stores it directly rather than recomputing from `expires_in`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current unix time in whole seconds.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Access/refresh token pair with the access token's expiry.
///
/// Replaced wholesale on exchange and refresh; never patched field by field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of `access_token` as unix seconds
    pub expires_at: i64,
}

impl TokenSet {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Whether the access token is still usable at `now`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at > now
    }

    /// Whether the access token expires inside `buffer_secs` of `now`.
    pub fn expires_within(&self, now: i64, buffer_secs: i64) -> bool {
        self.expires_at < now.saturating_add(buffer_secs)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// JSON body for `POST /oauth/token`.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub grant_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
}

impl<'a> TokenRequest<'a> {
    /// Authorization-code grant, sent once after the user approves access.
    pub fn authorization_code(client_id: &'a str, client_secret: &'a str, code: &'a str) -> Self {
        Self {
            client_id,
            client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
        }
    }

    /// Refresh-token grant.
    pub fn refresh(client_id: &'a str, client_secret: &'a str, refresh_token: &'a str) -> Self {
        Self {
            client_id,
            client_secret,
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(refresh_token),
        }
    }
}
