//! Error taxonomy for client operations
//!
//! Every failure from a dispatch is returned exactly once to the caller; the
//! client never retries. HTTP failures are classified by status code through
//! `classify_status`, the single mapping table.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::rate_limit::RateLimitInfo;

/// Status and decoded body of a failed API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    pub status: u16,
    /// Strava's `message` field, or the canonical reason for the status
    pub message: String,
    /// Parsed error body; an empty object when the body was not JSON
    pub body: Value,
}

impl ApiFailure {
    pub fn new(status: u16, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| {
                StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("unknown error")
                    .to_owned()
            });
        Self {
            status,
            message,
            body,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// HTTP failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    RateLimit,
    Api,
}

/// Map a non-success status code to its error category.
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimit,
        _ => ErrorKind::Api,
    }
}

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller misuse: no redirect URI configured, no access token held
    #[error("validation error: {0}")]
    Validation(String),

    /// No refresh token available; the OAuth flow has to be run again
    #[error("token refresh error: {0}")]
    TokenRefresh(String),

    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },

    #[error("authentication failed ({0})")]
    Authentication(ApiFailure),

    #[error("forbidden ({0})")]
    Authorization(ApiFailure),

    #[error("not found ({0})")]
    NotFound(ApiFailure),

    #[error("rate limit exceeded ({failure})")]
    RateLimit {
        failure: ApiFailure,
        rate_limit: Option<RateLimitInfo>,
    },

    #[error("API error ({0})")]
    Api(ApiFailure),

    /// A success response whose body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build the typed error for a failed response.
    pub fn from_response(status: u16, body: Value, rate_limit: Option<RateLimitInfo>) -> Self {
        let failure = ApiFailure::new(status, body);
        match classify_status(status) {
            ErrorKind::Authentication => Error::Authentication(failure),
            ErrorKind::Authorization => Error::Authorization(failure),
            ErrorKind::NotFound => Error::NotFound(failure),
            ErrorKind::RateLimit => Error::RateLimit {
                failure,
                rate_limit,
            },
            ErrorKind::Api => Error::Api(failure),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Network {
                message: format!("request timed out after {}ms", timeout.as_millis()),
                timed_out: true,
            }
        } else {
            Error::Network {
                message: err.to_string(),
                timed_out: false,
            }
        }
    }

    /// HTTP status for errors that came from a response.
    pub fn status(&self) -> Option<u16> {
        self.api_failure().map(|f| f.status)
    }

    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Error::Authentication(f)
            | Error::Authorization(f)
            | Error::NotFound(f)
            | Error::Api(f)
            | Error::RateLimit { failure: f, .. } => Some(f),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network { timed_out: true, .. })
    }

    /// Short label for metrics and logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::TokenRefresh(_) => "token_refresh",
            Error::Network { timed_out: true, .. } => "timeout",
            Error::Network { .. } => "network",
            Error::Authentication(_) => "authentication",
            Error::Authorization(_) => "authorization",
            Error::NotFound(_) => "not_found",
            Error::RateLimit { .. } => "rate_limit",
            Error::Api(_) => "api",
            Error::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<strava_auth::Error> for Error {
    fn from(err: strava_auth::Error) -> Self {
        Error::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_known_statuses() {
        assert_eq!(classify_status(401), ErrorKind::Authentication);
        assert_eq!(classify_status(403), ErrorKind::Authorization);
        assert_eq!(classify_status(404), ErrorKind::NotFound);
        assert_eq!(classify_status(429), ErrorKind::RateLimit);
    }

    #[test]
    fn classify_unknown_statuses_as_api() {
        for status in [400, 409, 418, 500, 502, 503] {
            assert_eq!(classify_status(status), ErrorKind::Api, "status {status}");
        }
    }

    #[test]
    fn from_response_maps_variants() {
        assert!(matches!(
            Error::from_response(429, json!({}), None),
            Error::RateLimit { .. }
        ));
        assert!(matches!(
            Error::from_response(401, json!({}), None),
            Error::Authentication(_)
        ));
        assert!(matches!(
            Error::from_response(404, json!({}), None),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_response(500, json!({}), None),
            Error::Api(_)
        ));
    }

    #[test]
    fn message_comes_from_body_when_present() {
        let body = json!({
            "message": "Authorization Error",
            "errors": [{"resource": "Athlete", "field": "access_token", "code": "invalid"}]
        });
        let err = Error::from_response(401, body.clone(), None);
        let failure = err.api_failure().unwrap();
        assert_eq!(failure.message, "Authorization Error");
        assert_eq!(failure.body, body);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn message_falls_back_to_status_reason() {
        let err = Error::from_response(404, json!({}), None);
        assert_eq!(err.to_string(), "not found (404: Not Found)");
    }

    #[test]
    fn rate_limit_carries_snapshot() {
        let info = RateLimitInfo::parse("100,1000", "100,400").unwrap();
        match Error::from_response(429, json!({"message": "Rate Limit Exceeded"}), Some(info)) {
            Error::RateLimit {
                failure,
                rate_limit,
            } => {
                assert_eq!(failure.message, "Rate Limit Exceeded");
                assert_eq!(rate_limit, Some(info));
            }
            other => panic!("expected RateLimit, got {other:?}"),
        }
    }

    #[test]
    fn network_predicates() {
        let timeout = Error::Network {
            message: "request timed out after 30000ms".into(),
            timed_out: true,
        };
        assert!(timeout.is_network());
        assert!(timeout.is_timeout());
        assert_eq!(timeout.kind_label(), "timeout");
        assert_eq!(timeout.status(), None);

        let refused = Error::Network {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert!(refused.is_network());
        assert!(!refused.is_timeout());
    }

    #[test]
    fn auth_helper_errors_become_validation() {
        let err: Error = strava_auth::Error::InvalidUrl("bad".into()).into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
