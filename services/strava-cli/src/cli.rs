//! Command-line arguments

use clap::{Parser, Subcommand};
use strava_client::models::StreamType;

#[derive(Debug, Parser)]
#[command(
    name = "strava",
    about = "Strava API command-line client",
    long_about = "Authorize against Strava, keep tokens refreshed on disk, and print API results as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: strava.toml)
    #[arg(long, global = true, env = "CONFIG_PATH")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the OAuth authorize URL and CSRF state
    AuthorizeUrl,

    /// Exchange an authorization code and save the tokens
    Exchange {
        /// `code` query parameter from the redirect
        code: String,
    },

    /// Refresh the access token now
    Refresh,

    /// Authenticated athlete
    Athlete,

    /// Authenticated athlete's totals
    Stats,

    /// Athlete activities, newest first
    Activities {
        /// Page to fetch (first page with --all)
        #[arg(long)]
        page: Option<u32>,

        /// Activities per page (max 200)
        #[arg(long)]
        per_page: Option<u32>,

        /// Follow pages until the last one
        #[arg(long)]
        all: bool,
    },

    /// One activity with all segment efforts
    Activity { id: u64 },

    /// Activity streams, keyed by type
    Streams {
        id: u64,

        /// Stream keys, e.g. time heartrate latlng (default: Strava's choice)
        #[arg(value_parser = parse_stream_type)]
        keys: Vec<StreamType>,
    },

    /// Heart rate and power zone distribution
    Zones { id: u64 },

    /// Activity laps
    Laps { id: u64 },

    /// Current quota usage
    RateLimit,

    /// Verify the saved credentials work; exits 1 when they do not
    Check,

    /// Revoke access and forget the saved tokens
    Deauthorize,
}

fn parse_stream_type(raw: &str) -> Result<StreamType, String> {
    raw.parse()
}
