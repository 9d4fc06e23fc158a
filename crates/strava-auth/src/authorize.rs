//! Authorization URL construction and CSRF state generation
//!
//! The browser step of the OAuth flow: the user is sent to
//! `{oauth_base}/authorize` with the client id, redirect URI and scope, and
//! Strava redirects back with `code` (and the unchanged `state`).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use url::Url;

use crate::constants::AUTHORIZE_PATH;
use crate::error::{Error, Result};

/// Whether Strava should re-prompt a user who already granted access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPrompt {
    #[default]
    Auto,
    Force,
}

impl ApprovalPrompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalPrompt::Auto => "auto",
            ApprovalPrompt::Force => "force",
        }
    }
}

/// Generate a random opaque `state` value for CSRF protection.
///
/// 32 random bytes, URL-safe base64 without padding (43 characters).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the authorize URL with all query parameters URL-encoded.
///
/// `state` is omitted from the query when `None`.
pub fn build_authorization_url(
    oauth_base_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: Option<&str>,
    approval_prompt: ApprovalPrompt,
) -> Result<String> {
    let endpoint = format!("{}{AUTHORIZE_PATH}", oauth_base_url.trim_end_matches('/'));
    let mut url = Url::parse(&endpoint)
        .map_err(|e| Error::InvalidUrl(format!("authorize endpoint {endpoint}: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("approval_prompt", approval_prompt.as_str())
            .append_pair("scope", scope);
        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }

    Ok(url.into())
}
