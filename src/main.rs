// ABOUTME: Main entry point for the stream alert bot
// ABOUTME: Initializes logging, config, the initial credential, and the two periodic tasks

use anyhow::{Context, Result};
use herald::{
    alerter::{self, AlertService},
    botlog::BotLogger,
    config::Config,
    discord::DiscordClient,
    traits::{ChatTransport, StreamingApi},
    twitch::TwitchClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting stream alert bot");

    // Load configuration; unreadable config is fatal before anything starts
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!(
        tracked_streams = config.streams.len(),
        poll_interval_secs = config.poller.poll_interval_secs,
        token_renew_days = config.poller.token_renew_days,
        history_window = config.poller.history_window,
        log_channel = config.discord.log_channel_id.is_some(),
        "Configuration loaded"
    );

    let transport: Arc<dyn ChatTransport> = Arc::new(DiscordClient::new(&config.discord.token));
    let logger = BotLogger::new(Arc::clone(&transport), config.discord.log_channel_id);
    let api: Arc<dyn StreamingApi> = Arc::new(TwitchClient::new(
        &config.twitch.client_id,
        &config.twitch.client_secret,
    ));

    // The initial exchange is fatal; nothing can poll without a credential
    let token = api
        .obtain_token()
        .await
        .context("Initial access token acquisition failed")?;
    logger.log("Access token successfully obtained!").await;

    let poll_interval = Duration::from_secs(config.poller.poll_interval_secs);
    let renew_interval = Duration::from_secs(config.poller.token_renew_days * 24 * 60 * 60);

    let service = AlertService::new(&config, transport, api, token, logger.clone());

    // Startup complete: alerts are allowed from here on
    service.set_ready(true);
    logger.log("Stream alert service ready!").await;

    // Both periodic tasks multiplex on this one execution context. The
    // poller never returns; a renewal failure surfaces here and is fatal.
    tokio::select! {
        _ = alerter::start_poller(&service, poll_interval) => {
            anyhow::bail!("liveness poll task exited unexpectedly")
        }
        result = alerter::start_token_renewal(&service, renew_interval) => {
            result.context("token renewal failed, shutting down")
        }
    }
}
