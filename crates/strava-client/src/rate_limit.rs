//! Rate-limit tracking from Strava response headers
//!
//! Strava reports two windows on every response: a short-term (15 minute)
//! and a long-term (daily) quota. Each header carries `short,long`:
//!
//! ```text
//! x-ratelimit-limit: 100,1000
//! x-ratelimit-usage: 10,50
//! ```
//!
//! Both headers must be present and well formed for a snapshot to be
//! produced. Anything else yields `None` and the caller keeps its previous
//! snapshot.

use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::warn;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const USAGE_HEADER: &str = "x-ratelimit-usage";

/// Usage against a single quota window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitWindow {
    pub usage: u32,
    pub limit: u32,
}

impl RateLimitWindow {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.usage)
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage >= self.limit
    }
}

/// Snapshot of both quota windows from the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub short_term: RateLimitWindow,
    pub long_term: RateLimitWindow,
}

impl RateLimitInfo {
    /// Parse the raw `limit` and `usage` header values.
    pub fn parse(limit: &str, usage: &str) -> Option<Self> {
        let (short_limit, long_limit) = parse_pair(limit)?;
        let (short_usage, long_usage) = parse_pair(usage)?;
        Some(Self {
            short_term: RateLimitWindow {
                usage: short_usage,
                limit: short_limit,
            },
            long_term: RateLimitWindow {
                usage: long_usage,
                limit: long_limit,
            },
        })
    }

    /// Extract a snapshot from response headers.
    ///
    /// Returns `None` when either header is missing or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let limit = headers.get(LIMIT_HEADER)?.to_str().ok()?;
        let usage = headers.get(USAGE_HEADER)?.to_str().ok()?;
        let parsed = Self::parse(limit, usage);
        if parsed.is_none() {
            warn!(limit, usage, "ignoring malformed rate limit headers");
        }
        parsed
    }
}

/// `"a,b"` into two integers. Exactly two comma-separated values.
fn parse_pair(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.split(',');
    let first = parts.next()?.trim().parse().ok()?;
    let second = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}
