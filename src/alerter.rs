// ABOUTME: Poll cycle coordinator: liveness query, per-channel dedup scan, alert dispatch
// ABOUTME: Dedup is stateless across restarts; channel history is the only record consulted

use crate::{
    botlog::BotLogger,
    commands,
    config::{Config, StreamConfig},
    traits::{ChannelMessage, ChatTransport, StreamingApi},
    twitch::{AccessToken, LiveSession},
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::interval;

/// One constructed service instance owning the tracked-streams table, the
/// remote collaborators, the readiness flag, and the current token.
///
/// The token is replaced by value on each successful renewal; the poll path
/// only ever clones it out of the lock.
pub struct AlertService {
    streams: BTreeMap<String, StreamConfig>,
    transport: Arc<dyn ChatTransport>,
    api: Arc<dyn StreamingApi>,
    token: RwLock<AccessToken>,
    ready: AtomicBool,
    logger: BotLogger,
    history_window: usize,
    command_prefix: String,
    control_role: String,
}

impl AlertService {
    pub fn new(
        config: &Config,
        transport: Arc<dyn ChatTransport>,
        api: Arc<dyn StreamingApi>,
        token: AccessToken,
        logger: BotLogger,
    ) -> Self {
        Self {
            streams: config.streams.clone(),
            transport,
            api,
            token: RwLock::new(token),
            // Disabled until the startup sequence finishes and flips it
            ready: AtomicBool::new(false),
            logger,
            history_window: config.poller.history_window,
            command_prefix: config.discord.command_prefix.clone(),
            control_role: config.discord.control_role.clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Handle a possible control message from the chat side.
    /// Returns the reply to post, or None when the message is not a
    /// recognized verb or the invoker lacks the control role.
    pub fn handle_control_message(&self, body: &str, invoker_roles: &[String]) -> Option<String> {
        let command = commands::parse_control_command(&self.command_prefix, body)?;
        if !commands::is_authorized(&self.control_role, invoker_roles) {
            tracing::debug!(?command, "Ignoring control command from unauthorized user");
            return None;
        }
        let reply = commands::apply_control_command(command, &self.ready);
        tracing::info!(?command, ready = self.is_ready(), "Control command applied");
        Some(reply)
    }

    /// Replace the held token with a freshly exchanged one
    pub async fn renew_token(&self) -> Result<()> {
        let token = self
            .api
            .obtain_token()
            .await
            .context("Access token exchange failed")?;
        *self.token.write().await = token;
        self.logger.log("Access token successfully obtained!").await;
        Ok(())
    }

    /// One liveness poll: query once for all tracked accounts, then
    /// dedup-check and dispatch per live account in the order returned.
    /// Request-level failures are logged and confined to this cycle.
    pub async fn run_poll_cycle(&self) {
        if !self.is_ready() {
            return;
        }
        if self.streams.is_empty() {
            // An unfiltered helix query would return arbitrary top streams
            tracing::debug!("No streams configured, skipping poll");
            return;
        }

        let logins: Vec<String> = self.streams.keys().cloned().collect();
        let token = self.token.read().await.clone();
        let sessions = match self.api.live_streams(&logins, &token).await {
            Ok(sessions) => sessions,
            Err(e) => {
                self.logger
                    .error(&format!("Liveness query failed: {}", e))
                    .await;
                return;
            }
        };

        self.send_alerts(&sessions).await;
    }

    /// Announce each session not already covered by a recent alert.
    /// A history or dispatch failure skips only the affected account.
    pub async fn send_alerts(&self, sessions: &[LiveSession]) {
        for session in sessions {
            let Some(stream) = self.streams.get(&session.user_login) else {
                tracing::warn!(
                    login = %session.user_login,
                    "Liveness result for untracked account, skipping"
                );
                continue;
            };

            match self.already_alerted(stream, session.started_at).await {
                Ok(true) => {
                    tracing::debug!(login = %session.user_login, "Session already announced");
                }
                Ok(false) => {
                    if let Err(e) = self
                        .transport
                        .send(stream.announcement_channel_id, &stream.alert_msg, true)
                        .await
                    {
                        self.logger
                            .error(&format!(
                                "Failed to announce {}: {:#}",
                                session.user_login, e
                            ))
                            .await;
                        continue;
                    }
                    self.logger
                        .log(&format!(
                            "Announced {} live since {}",
                            session.user_login,
                            session.started_at.to_rfc3339()
                        ))
                        .await;
                }
                Err(e) => {
                    self.logger
                        .error(&format!(
                            "History read failed for {}: {:#}",
                            session.user_login, e
                        ))
                        .await;
                }
            }
        }
    }

    /// Whether this session was already announced, judged solely from the
    /// channel's recent history window.
    async fn already_alerted(
        &self,
        stream: &StreamConfig,
        started_at: DateTime<Utc>,
    ) -> Result<bool> {
        let history = self
            .transport
            .recent_messages(stream.announcement_channel_id, self.history_window)
            .await?;
        Ok(covers_session(&history, &stream.alert_msg, started_at))
    }
}

/// Decision rule: already alerted iff a message matching the template exists
/// and the most recent such message is not earlier than the session start.
/// An alert older than the session start belongs to a previous session.
pub fn covers_session(
    history: &[ChannelMessage],
    alert_msg: &str,
    started_at: DateTime<Utc>,
) -> bool {
    latest_matching_alert(history, alert_msg).map_or(false, |posted_at| posted_at >= started_at)
}

/// Timestamp of the most recent message whose content equals the template.
/// History order is unspecified at the transport seam, so scan everything.
fn latest_matching_alert(history: &[ChannelMessage], alert_msg: &str) -> Option<DateTime<Utc>> {
    history
        .iter()
        .filter(|message| message.content == alert_msg)
        .map(|message| message.created_at)
        .max()
}

/// Run the liveness poll timer. Each tick runs a full cycle to completion
/// before the next tick is honored, so cycles of this task never overlap.
pub async fn start_poller(service: &AlertService, poll_interval: Duration) {
    tracing::info!(
        interval_secs = poll_interval.as_secs(),
        "Starting liveness poll task"
    );
    let mut ticker = interval(poll_interval);
    loop {
        ticker.tick().await;
        service.run_poll_cycle().await;
    }
}

/// Run the credential renewal timer. Renewal is independent of readiness so
/// a long-disabled service never lets its credential expire. A failed
/// exchange is fatal and propagates to the caller.
pub async fn start_token_renewal(service: &AlertService, renew_interval: Duration) -> Result<()> {
    tracing::info!(
        interval_secs = renew_interval.as_secs(),
        "Starting token renewal task"
    );
    let mut ticker = interval(renew_interval);
    // The startup exchange already happened; skip the immediate first tick
    ticker.tick().await;
    loop {
        ticker.tick().await;
        service.renew_token().await?;
    }
}
