//! Client configuration and the token refresh callback
//!
//! A `ClientConfig` is built once, moved into the client, and never changed
//! afterwards. The refresh callback is how callers persist rotated tokens;
//! the client itself keeps tokens only in memory.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use common::Secret;
use serde::Serialize;
use strava_auth::{API_BASE_URL, OAUTH_BASE_URL, TokenSet};

use crate::error::Result;

/// Refresh tokens this long before the access token expires.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(600);

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notified after every successful token refresh.
///
/// The client awaits the returned future before the refresh completes; an
/// error from the handler is returned from the refresh (and from the request
/// that triggered it).
///
/// Any `Fn(TokenSet) -> impl Future<Output = Result<()>>` closure implements
/// this trait.
pub trait TokenRefreshHandler: Send + Sync {
    fn on_token_refresh<'a>(
        &'a self,
        tokens: &'a TokenSet,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

impl<F, Fut> TokenRefreshHandler for F
where
    F: Fn(TokenSet) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn on_token_refresh<'a>(
        &'a self,
        tokens: &'a TokenSet,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self(tokens.clone()))
    }
}

/// Client settings.
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Required only for `authorization_url`
    pub redirect_uri: Option<String>,
    /// Refresh expiring tokens before authenticated requests
    pub auto_refresh: bool,
    pub refresh_buffer: Duration,
    pub request_timeout: Duration,
    pub api_base_url: String,
    pub oauth_base_url: String,
    pub on_token_refresh: Option<Arc<dyn TokenRefreshHandler>>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            redirect_uri: None,
            auto_refresh: true,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            api_base_url: API_BASE_URL.to_string(),
            oauth_base_url: OAUTH_BASE_URL.to_string(),
            on_token_refresh: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Point both API and OAuth calls somewhere other than strava.com.
    pub fn with_base_urls(
        mut self,
        api_base_url: impl Into<String>,
        oauth_base_url: impl Into<String>,
    ) -> Self {
        self.api_base_url = api_base_url.into();
        self.oauth_base_url = oauth_base_url.into();
        self
    }

    pub fn with_token_refresh_handler(mut self, handler: impl TokenRefreshHandler + 'static) -> Self {
        self.on_token_refresh = Some(Arc::new(handler));
        self
    }

    /// Buffer in whole seconds, clamped to `i64`.
    pub(crate) fn refresh_buffer_secs(&self) -> i64 {
        i64::try_from(self.refresh_buffer.as_secs()).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("redirect_uri", &self.redirect_uri)
            .field("auto_refresh", &self.auto_refresh)
            .field("refresh_buffer", &self.refresh_buffer)
            .field("request_timeout", &self.request_timeout)
            .field("api_base_url", &self.api_base_url)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("on_token_refresh", &self.on_token_refresh.is_some())
            .finish()
    }
}

/// Non-secret view of the client's configuration and token state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub redirect_uri: Option<String>,
    pub auto_refresh: bool,
    pub refresh_buffer_secs: u64,
    pub has_tokens: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("12345", "secret");
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_buffer, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.api_base_url, "https://www.strava.com/api/v3");
        assert_eq!(config.oauth_base_url, "https://www.strava.com/oauth");
        assert!(config.redirect_uri.is_none());
        assert!(config.on_token_refresh.is_none());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = ClientConfig::new("1", "s")
            .with_redirect_uri("http://localhost/cb")
            .with_auto_refresh(false)
            .with_refresh_buffer(Duration::from_secs(60))
            .with_request_timeout(Duration::from_secs(5))
            .with_base_urls("http://127.0.0.1/api/v3", "http://127.0.0.1/oauth");
        assert_eq!(config.redirect_uri.as_deref(), Some("http://localhost/cb"));
        assert!(!config.auto_refresh);
        assert_eq!(config.refresh_buffer_secs(), 60);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.oauth_base_url, "http://127.0.0.1/oauth");
    }

    #[test]
    fn debug_hides_secret() {
        let config = ClientConfig::new("1", "very-secret-value");
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-value"), "got: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn closure_handler_receives_tokens() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let config = ClientConfig::new("1", "s").with_token_refresh_handler(move |tokens: TokenSet| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(tokens);
                Ok::<(), crate::Error>(())
            }
        });

        let tokens = TokenSet::new("at", "rt", 99);
        let handler = config.on_token_refresh.clone().unwrap();
        handler.on_token_refresh(&tokens).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), &[tokens]);
    }
}
