// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates required fields and provides sensible defaults for poller tuning knobs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub streams: BTreeMap<String, StreamConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_channel_id: Option<u64>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default = "default_control_role")]
    pub control_role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_token_renew_days")]
    pub token_renew_days: u64,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            token_renew_days: default_token_renew_days(),
            history_window: default_history_window(),
        }
    }
}

/// Per-account alert target: where to announce and what to say
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub announcement_channel_id: u64,
    pub alert_msg: String,
}

fn default_command_prefix() -> String {
    ".".to_string()
}

fn default_control_role() -> String {
    "Mod".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_token_renew_days() -> u64 {
    30
}

fn default_history_window() -> usize {
    10
}

impl Config {
    /// Load configuration from config.toml with environment variable overrides.
    ///
    /// A missing or unparseable file is an error, not a silent default: the
    /// service cannot do anything useful without credentials and targets.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("HERALD_CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path))?;
        let mut config = toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse {}", config_path))?;

        // Override with environment variables if present
        if let Ok(val) = std::env::var("DISCORD_TOKEN") {
            config.discord.token = val;
        }
        if let Ok(val) = std::env::var("DISCORD_LOG_CHANNEL_ID") {
            config.discord.log_channel_id = Some(val.parse().with_context(|| {
                format!("DISCORD_LOG_CHANNEL_ID must be a channel id, got: {}", val)
            })?);
        }
        if let Ok(val) = std::env::var("TWITCH_CLIENT_ID") {
            config.twitch.client_id = val;
        }
        if let Ok(val) = std::env::var("TWITCH_CLIENT_SECRET") {
            config.twitch.client_secret = val;
        }

        // Validate required fields
        if config.discord.token.trim().is_empty() {
            anyhow::bail!("discord.token is required (set in config.toml or DISCORD_TOKEN env var)");
        }
        if config.twitch.client_id.trim().is_empty() {
            anyhow::bail!(
                "twitch.client_id is required (set in config.toml or TWITCH_CLIENT_ID env var)"
            );
        }
        if config.twitch.client_secret.trim().is_empty() {
            anyhow::bail!(
                "twitch.client_secret is required (set in config.toml or TWITCH_CLIENT_SECRET env var)"
            );
        }
        if config.poller.poll_interval_secs == 0 {
            anyhow::bail!("poller.poll_interval_secs must be at least 1");
        }
        if config.poller.token_renew_days == 0 {
            anyhow::bail!("poller.token_renew_days must be at least 1");
        }
        if config.poller.history_window == 0 {
            anyhow::bail!("poller.history_window must be at least 1");
        }
        for (login, stream) in &config.streams {
            if stream.announcement_channel_id == 0 {
                anyhow::bail!("streams.{}.announcement_channel_id is required", login);
            }
            if stream.alert_msg.trim().is_empty() {
                anyhow::bail!("streams.{}.alert_msg must not be empty", login);
            }
        }

        Ok(config)
    }

    /// Tracked account logins in stable (sorted) order
    pub fn tracked_logins(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }
}
