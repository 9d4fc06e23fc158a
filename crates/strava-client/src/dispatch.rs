//! Request dispatch
//!
//! Every endpoint and token call goes through here so they all share the
//! same timeout, rate-limit capture, and status-to-error mapping.
//!
//! Two entry points:
//! - `request` runs the pre-flight token refresh, then dispatches
//! - `execute` dispatches as-is; token grant calls use it directly so a
//!   refresh can never trigger another refresh

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::client::StravaClient;
use crate::error::{Error, Result};
use crate::metrics;
use crate::rate_limit::RateLimitInfo;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters; `None` values are left out of the URL entirely
    pub params: Vec<(String, Option<String>)>,
    pub body: Option<Value>,
    /// Merged over the default `Content-Type: application/json`
    pub headers: HeaderMap,
    /// Overrides the configured API base URL
    pub base_url: Option<String>,
    /// Send without an `Authorization` header and skip the pre-flight refresh
    pub skip_auth: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn opt_param<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.params
            .push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

/// Join `base` and `path` and append the present query parameters.
pub(crate) fn build_url(base: &str, path: &str, params: &[(String, Option<String>)]) -> Result<Url> {
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url =
        Url::parse(&raw).map_err(|e| Error::Validation(format!("invalid request URL {raw}: {e}")))?;

    let mut present = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key.as_str(), v)))
        .peekable();
    if present.peek().is_some() {
        url.query_pairs_mut().extend_pairs(present);
    }
    Ok(url)
}

impl StravaClient {
    /// Dispatch an API call and decode the JSON response as `T`.
    ///
    /// With auto-refresh on, a held token expiring within the refresh buffer
    /// is refreshed before the request is built.
    pub async fn request<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        if self.config.auto_refresh && self.tokens.is_some() && !options.skip_auth {
            self.refresh_token_if_needed().await?;
        }
        self.execute(method, path, options).await
    }

    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub(crate) async fn execute<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let base = options
            .base_url
            .as_deref()
            .unwrap_or(&self.config.api_base_url);
        let url = build_url(base, path, &options.params)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);

        if !options.skip_auth {
            let access_token = self
                .tokens
                .as_ref()
                .map(|t| t.access_token.as_str())
                .ok_or_else(|| {
                    Error::Validation("access token required; authorize or set tokens first".into())
                })?;
            let value = HeaderValue::from_str(&format!("Bearer {access_token}"))
                .map_err(|e| Error::Validation(format!("access token is not a valid header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let timeout = self.config.request_timeout;
        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        debug!("dispatching request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = Error::from_transport(e, timeout);
                metrics::record_error(err.kind_label());
                warn!(error = %err, "request failed before a response arrived");
                return Err(err);
            }
        };

        let status = response.status();
        if let Some(info) = RateLimitInfo::from_headers(response.headers()) {
            self.rate_limit = Some(info);
        }
        metrics::record_request(method.as_str(), status.as_u16());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = Error::from_transport(e, timeout);
                metrics::record_error(err.kind_label());
                return Err(err);
            }
        };

        if !status.is_success() {
            let body: Value =
                serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::Object(Default::default()));
            let err = Error::from_response(status.as_u16(), body, self.rate_limit);
            metrics::record_error(err.kind_label());
            warn!(status = status.as_u16(), error = %err, "API returned an error");
            return Err(err);
        }

        debug!(status = status.as_u16(), bytes = bytes.len(), "response received");
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload).map_err(|e| {
            let err = Error::InvalidResponse(format!("{method} {path}: {e}"));
            metrics::record_error(err.kind_label());
            err
        })
    }
}
