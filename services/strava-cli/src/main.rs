//! Strava command-line client
//!
//! Thin binary over `strava-client`:
//! 1. Loads TOML config and resolves the client secret
//! 2. Loads saved tokens from the token file
//! 3. Persists every refreshed token set through the refresh callback
//! 4. Prints endpoint results as pretty JSON on stdout; logs go to stderr

mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use strava_auth::{TokenStore, generate_state};
use strava_client::{ActivityListParams, AuthorizeOptions, StravaClient, TokenSet};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let store = Arc::new(
        TokenStore::load(config.tokens.path.clone())
            .await
            .with_context(|| format!("failed to load tokens from {}", config.tokens.path.display()))?,
    );
    let profile = config.tokens.profile.clone();

    let mut client = build_client(&config, store.clone())?;
    if let Some(tokens) = store.get(&profile).await {
        client.set_tokens(tokens);
    }
    info!(
        client_id = %config.strava.client_id,
        profile = %profile,
        has_tokens = client.tokens().is_some(),
        "client ready"
    );

    run(&mut client, &config, &store, cli.command).await
}

/// Client whose refresh callback writes new tokens to `store`.
fn build_client(config: &Config, store: Arc<TokenStore>) -> Result<StravaClient> {
    let profile = config.tokens.profile.clone();
    let client_config = config
        .client_config()?
        .with_token_refresh_handler(move |tokens: TokenSet| {
            let store = store.clone();
            let profile = profile.clone();
            async move {
                store.put(&profile, tokens).await.map_err(|e| {
                    strava_client::Error::TokenRefresh(format!("persisting refreshed tokens: {e}"))
                })
            }
        });
    Ok(StravaClient::new(client_config))
}

async fn run(
    client: &mut StravaClient,
    config: &Config,
    store: &TokenStore,
    command: Command,
) -> Result<()> {
    let profile = config.tokens.profile.as_str();

    match command {
        Command::AuthorizeUrl => {
            let state = generate_state();
            let url = client.authorization_url(
                &config.strava.scope,
                &AuthorizeOptions {
                    state: Some(state.clone()),
                    ..Default::default()
                },
            )?;
            print_json(&json!({ "url": url, "state": state }))
        }
        Command::Exchange { code } => {
            let response = client
                .exchange_authorization_code(&code)
                .await
                .context("authorization code exchange failed")?;
            store.put(profile, response.token_set()).await?;
            print_json(&json!({
                "athlete": response.athlete,
                "expires_at": response.expires_at,
                "saved_to": store.path().display().to_string(),
            }))
        }
        Command::Refresh => {
            let response = client.refresh_access_token(None).await?;
            print_json(&json!({ "expires_at": response.expires_at }))
        }
        Command::Athlete => print_json(&client.get_athlete().await?),
        Command::Stats => {
            let athlete = client.get_athlete().await?;
            print_json(&client.get_athlete_stats(athlete.summary.id).await?)
        }
        Command::Activities {
            page,
            per_page,
            all,
        } => {
            let params = ActivityListParams {
                page,
                per_page,
                ..Default::default()
            };
            let activities = if all {
                client.get_all_activities(&params).await?
            } else {
                client.get_activities(&params).await?
            };
            print_json(&activities)
        }
        Command::Activity { id } => print_json(&client.get_activity(id, Some(true)).await?),
        Command::Streams { id, keys } => {
            print_json(&client.get_activity_streams(id, &keys, true).await?)
        }
        Command::Zones { id } => print_json(&client.get_activity_zones(id).await?),
        Command::Laps { id } => print_json(&client.get_activity_laps(id).await?),
        Command::RateLimit => {
            // The snapshot only exists once a response has been seen
            client.get_athlete().await?;
            print_json(&client.rate_limit_info())
        }
        Command::Check => {
            let connected = client.test_connection().await;
            print_json(&json!({
                "connected": connected,
                "client": client.client_info(),
                "rate_limit": client.rate_limit_info(),
            }))?;
            if !connected {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Deauthorize => {
            let revoked = client.deauthorize().await;
            let forgotten = store.remove(profile).await;
            deauthorize_outcome(profile, revoked, forgotten)?;
            print_json(&json!({ "deauthorized": true }))
        }
    }
}

/// Combine the revoke call with removal of the saved tokens.
///
/// A revoke failure wins over a token file failure; the latter is logged.
fn deauthorize_outcome(
    profile: &str,
    revoked: strava_client::Result<()>,
    forgotten: strava_auth::Result<Option<TokenSet>>,
) -> Result<()> {
    match (revoked, forgotten) {
        (Err(revoke_err), Err(store_err)) => {
            warn!(profile, error = %store_err, "failed to remove saved tokens");
            Err(revoke_err.into())
        }
        (Err(revoke_err), Ok(_)) => Err(revoke_err.into()),
        (Ok(()), Err(store_err)) => {
            Err(anyhow::Error::new(store_err).context("access revoked but saved tokens remain"))
        }
        (Ok(()), Ok(None)) => {
            warn!(profile, "no saved tokens for profile");
            Ok(())
        }
        (Ok(()), Ok(Some(_))) => Ok(()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
