//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is loaded from the STRAVA_CLIENT_SECRET env var or
//! client_secret_file, never stored in the TOML directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use strava_auth::{API_BASE_URL, DEFAULT_SCOPE, OAUTH_BASE_URL};
use strava_client::ClientConfig;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub strava: StravaConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
}

/// Application registration and client behavior
#[derive(Debug, Deserialize)]
pub struct StravaConfig {
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to STRAVA_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_refresh_buffer")]
    pub refresh_buffer_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,
}

/// Where tokens are persisted between runs
#[derive(Debug, Deserialize)]
pub struct TokensConfig {
    #[serde(default = "default_tokens_path")]
    pub path: PathBuf,
    /// Key inside the token file; lets one file hold several athletes
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            path: default_tokens_path(),
            profile: default_profile(),
        }
    }
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_refresh_buffer() -> u64 {
    600
}

fn default_timeout() -> u64 {
    30
}

fn default_auto_refresh() -> bool {
    true
}

fn default_api_base_url() -> String {
    API_BASE_URL.to_string()
}

fn default_oauth_base_url() -> String {
    OAUTH_BASE_URL.to_string()
}

fn default_tokens_path() -> PathBuf {
    PathBuf::from("strava-tokens.json")
}

fn default_profile() -> String {
    "default".to_string()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. STRAVA_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.strava.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }

        if config.strava.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, url) in [
            ("api_base_url", &config.strava.api_base_url),
            ("oauth_base_url", &config.strava.oauth_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if let Ok(secret) = std::env::var("STRAVA_CLIENT_SECRET") {
            config.strava.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.strava.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.strava.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("strava.toml")
    }

    /// Build the client configuration. Fails when no client secret was resolved.
    pub fn client_config(&self) -> common::Result<ClientConfig> {
        let strava = &self.strava;
        let secret = strava.client_secret.as_ref().ok_or_else(|| {
            common::Error::Config(
                "client secret missing: set STRAVA_CLIENT_SECRET or client_secret_file".into(),
            )
        })?;

        let mut config = ClientConfig::new(&strava.client_id, secret.expose().as_str())
            .with_auto_refresh(strava.auto_refresh)
            .with_refresh_buffer(Duration::from_secs(strava.refresh_buffer_secs))
            .with_request_timeout(Duration::from_secs(strava.timeout_secs))
            .with_base_urls(&strava.api_base_url, &strava.oauth_base_url);
        if let Some(ref redirect_uri) = strava.redirect_uri {
            config = config.with_redirect_uri(redirect_uri);
        }
        Ok(config)
    }
}
