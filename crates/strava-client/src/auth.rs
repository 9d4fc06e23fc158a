//! Token lifecycle: authorize URL, code exchange, refresh, deauthorize
//!
//! Grant calls are dispatched with `execute` against the OAuth base URL and
//! without an `Authorization` header. Refresh replaces the held `TokenSet`
//! wholesale and then awaits the configured refresh handler.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strava_auth::{
    ApprovalPrompt, DEAUTHORIZE_PATH, TOKEN_PATH, TokenRequest, TokenSet, build_authorization_url,
    unix_now,
};
use tracing::{debug, info, warn};

use crate::client::StravaClient;
use crate::dispatch::RequestOptions;
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::SummaryAthlete;

/// Token endpoint response for both grants.
///
/// `athlete` is only present on the authorization-code grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry, unix seconds
    pub expires_at: i64,
    /// Seconds remaining at issue time
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub athlete: Option<SummaryAthlete>,
}

impl TokenResponse {
    pub fn token_set(&self) -> TokenSet {
        TokenSet::new(&self.access_token, &self.refresh_token, self.expires_at)
    }
}

/// Optional parts of the authorize URL.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    /// Echoed back on the redirect; compare it to detect CSRF
    pub state: Option<String>,
    pub approval_prompt: ApprovalPrompt,
}

impl StravaClient {
    /// URL to send the user to for the authorization step.
    ///
    /// Fails with `Error::Validation` when no redirect URI is configured.
    pub fn authorization_url(&self, scope: &str, options: &AuthorizeOptions) -> Result<String> {
        let redirect_uri = self.config.redirect_uri.as_deref().ok_or_else(|| {
            Error::Validation("redirect_uri is required to build an authorization URL".into())
        })?;
        let url = build_authorization_url(
            &self.config.oauth_base_url,
            &self.config.client_id,
            redirect_uri,
            scope,
            options.state.as_deref(),
            options.approval_prompt,
        )?;
        Ok(url)
    }

    /// Exchange the `code` from the redirect for tokens and hold them.
    ///
    /// Returns the full response, including the authenticated athlete.
    pub async fn exchange_authorization_code(&mut self, code: &str) -> Result<TokenResponse> {
        let body = grant_body(&TokenRequest::authorization_code(
            &self.config.client_id,
            self.config.client_secret.expose(),
            code,
        ))?;
        let response: TokenResponse = self
            .execute(Method::POST, TOKEN_PATH, self.oauth_options(body))
            .await?;

        self.tokens = Some(response.token_set());
        info!(
            athlete_id = response.athlete.as_ref().map(|a| a.id),
            expires_at = response.expires_at,
            "authorization code exchanged"
        );
        Ok(response)
    }

    /// Refresh the access token with `refresh_token`, or the held one.
    ///
    /// On success the held tokens are replaced and the refresh handler is
    /// awaited with them; a handler error is returned as-is.
    pub async fn refresh_access_token(&mut self, refresh_token: Option<&str>) -> Result<TokenResponse> {
        let refresh_token = refresh_token
            .map(str::to_owned)
            .or_else(|| self.tokens.as_ref().map(|t| t.refresh_token.clone()))
            .ok_or_else(|| {
                Error::TokenRefresh("no refresh token available; re-run the OAuth flow".into())
            })?;

        let body = grant_body(&TokenRequest::refresh(
            &self.config.client_id,
            self.config.client_secret.expose(),
            &refresh_token,
        ))?;
        let response: TokenResponse = self
            .execute(Method::POST, TOKEN_PATH, self.oauth_options(body))
            .await?;

        let tokens = response.token_set();
        self.tokens = Some(tokens.clone());
        metrics::record_token_refresh();
        info!(expires_at = tokens.expires_at, "access token refreshed");

        if let Some(handler) = self.config.on_token_refresh.clone() {
            handler.on_token_refresh(&tokens).await?;
        }
        Ok(response)
    }

    /// Refresh when the held access token expires within the refresh buffer.
    pub(crate) async fn refresh_token_if_needed(&mut self) -> Result<()> {
        let Some(tokens) = &self.tokens else {
            return Ok(());
        };
        let now = unix_now();
        if !tokens.expires_within(now, self.config.refresh_buffer_secs()) {
            return Ok(());
        }

        debug!(
            expires_in_secs = tokens.expires_at - now,
            buffer_secs = self.config.refresh_buffer_secs(),
            "access token inside refresh buffer, refreshing before request"
        );
        self.refresh_access_token(None).await.map(|_| ())
    }

    /// Revoke access for this application, then drop the held tokens.
    ///
    /// Local tokens are cleared even when the revoke call fails; the failure
    /// is still returned.
    pub async fn deauthorize(&mut self) -> Result<()> {
        let oauth_base = self.config.oauth_base_url.clone();
        let result: Result<Value> = self
            .request(
                Method::POST,
                DEAUTHORIZE_PATH,
                RequestOptions::new().base_url(oauth_base),
            )
            .await;
        self.tokens = None;

        match result {
            Ok(_) => {
                info!("access revoked");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "revoke failed, local tokens cleared anyway");
                Err(e)
            }
        }
    }

    fn oauth_options(&self, body: Value) -> RequestOptions {
        RequestOptions::new()
            .base_url(self.config.oauth_base_url.clone())
            .body(body)
            .skip_auth()
    }
}

fn grant_body(request: &TokenRequest<'_>) -> Result<Value> {
    serde_json::to_value(request)
        .map_err(|e| Error::Validation(format!("serializing token request: {e}")))
}
