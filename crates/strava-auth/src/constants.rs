//! Strava OAuth and API endpoint constants

/// OAuth base; `/authorize`, `/token` and `/deauthorize` hang off it.
pub const OAUTH_BASE_URL: &str = "https://www.strava.com/oauth";

/// Versioned REST API base.
pub const API_BASE_URL: &str = "https://www.strava.com/api/v3";

pub const AUTHORIZE_PATH: &str = "/authorize";
pub const TOKEN_PATH: &str = "/token";
pub const DEAUTHORIZE_PATH: &str = "/deauthorize";

/// Scope requested when the caller does not name one. Strava scopes are
/// comma separated.
pub const DEFAULT_SCOPE: &str = "read,activity:read_all";
