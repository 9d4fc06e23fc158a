//! The `StravaClient` and its in-memory state
//!
//! The client exclusively owns the current `TokenSet` and the latest
//! `RateLimitInfo`. Every operation that can change either takes `&mut self`,
//! so there is one logical owner and no locking. Token lifecycle methods live
//! in `auth`, dispatch in `dispatch`, and endpoint wrappers in `endpoints`.

use strava_auth::{TokenSet, unix_now};
use tracing::debug;

use crate::config::{ClientConfig, ClientInfo};
use crate::rate_limit::RateLimitInfo;

/// Typed Strava API client.
pub struct StravaClient {
    pub(crate) config: ClientConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) tokens: Option<TokenSet>,
    pub(crate) rate_limit: Option<RateLimitInfo>,
}

impl StravaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Use a caller-built `reqwest::Client` (proxies, custom TLS roots).
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        debug!(
            client_id = %config.client_id,
            auto_refresh = config.auto_refresh,
            refresh_buffer_secs = config.refresh_buffer.as_secs(),
            "strava client created"
        );
        Self {
            config,
            http,
            tokens: None,
            rate_limit: None,
        }
    }

    /// Replace the held tokens, e.g. with ones loaded from storage.
    pub fn set_tokens(&mut self, tokens: TokenSet) {
        self.tokens = Some(tokens);
    }

    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    /// Forget the held tokens locally. Does not revoke them; see `deauthorize`.
    pub fn clear_tokens(&mut self) {
        self.tokens = None;
    }

    /// True iff tokens are held and the access token has not yet expired.
    pub fn has_valid_tokens(&self) -> bool {
        self.tokens
            .as_ref()
            .is_some_and(|tokens| tokens.is_valid_at(unix_now()))
    }

    /// Quota snapshot from the most recent response that carried one.
    pub fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        self.rate_limit
    }

    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            auto_refresh: self.config.auto_refresh,
            refresh_buffer_secs: self.config.refresh_buffer.as_secs(),
            has_tokens: self.tokens.is_some(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
