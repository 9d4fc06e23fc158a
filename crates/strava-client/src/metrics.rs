//! Client-side metrics
//!
//! Emitted through the `metrics` facade. Nothing is recorded unless the
//! embedding application installs a recorder.
//!
//! - `strava_requests_total` (counter): labels `method`, `status`
//! - `strava_request_errors_total` (counter): label `kind`
//! - `strava_token_refreshes_total` (counter)

/// Record a response received from the API.
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "strava_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a failed dispatch by error kind.
pub fn record_error(kind: &'static str) {
    metrics::counter!("strava_request_errors_total", "kind" => kind).increment(1);
}

/// Record a successful token refresh.
pub fn record_token_refresh() {
    metrics::counter!("strava_token_refreshes_total").increment(1);
}
