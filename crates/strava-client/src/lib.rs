//! Typed async client for the Strava v3 API
//!
//! `StravaClient` owns an OAuth token set and a rate-limit snapshot. Requests
//! go through a single dispatcher that refreshes expiring tokens first,
//! attaches the bearer token, records the `X-RateLimit-*` headers, and maps
//! failures onto `Error`.
//!
//! ```no_run
//! # async fn run() -> strava_client::Result<()> {
//! use strava_client::{ActivityListParams, ClientConfig, StravaClient, TokenSet};
//!
//! let config = ClientConfig::new("12345", "client-secret")
//!     .with_token_refresh_handler(|tokens: TokenSet| async move {
//!         // persist tokens somewhere durable
//!         let _ = tokens;
//!         Ok::<(), strava_client::Error>(())
//!     });
//! let mut client = StravaClient::new(config);
//! client.set_tokens(TokenSet::new("access", "refresh", 1_700_000_000));
//!
//! let athlete = client.get_athlete().await?;
//! let activities = client.get_all_activities(&ActivityListParams::default()).await?;
//! println!("{} has {} activities", athlete.summary.id, activities.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod config;
mod dispatch;
mod endpoints;
pub mod error;
mod metrics;
pub mod models;
pub mod rate_limit;

pub use auth::{AuthorizeOptions, TokenResponse};
pub use client::StravaClient;
pub use config::{
    ClientConfig, ClientInfo, DEFAULT_REFRESH_BUFFER, DEFAULT_REQUEST_TIMEOUT, TokenRefreshHandler,
};
pub use dispatch::RequestOptions;
pub use endpoints::{ActivityListParams, DEFAULT_PAGE_SIZE};
pub use error::{ApiFailure, Error, ErrorKind, Result, classify_status};
pub use rate_limit::{RateLimitInfo, RateLimitWindow};
pub use strava_auth::{ApprovalPrompt, TokenSet};
