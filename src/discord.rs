// ABOUTME: Discord REST implementation of the ChatTransport seam
// ABOUTME: Reads channel history and posts alerts with broadcast mentions permitted

use crate::traits::{ChannelMessage, ChatTransport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize)]
struct MessageRecord {
    content: String,
    timestamp: String,
}

#[derive(Clone)]
pub struct DiscordClient {
    token: String,
    http: reqwest::Client,
}

impl DiscordClient {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl ChatTransport for DiscordClient {
    async fn recent_messages(&self, channel_id: u64, limit: usize) -> Result<Vec<ChannelMessage>> {
        let url = format!("{}/channels/{}/messages", API_BASE, channel_id);
        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .with_context(|| format!("History request for channel {} failed", channel_id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch history for channel {}: {}",
                channel_id,
                response.status()
            );
        }

        let records: Vec<MessageRecord> = response
            .json()
            .await
            .context("Failed to decode channel history")?;

        records
            .into_iter()
            .map(|record| {
                let created_at = DateTime::parse_from_rfc3339(&record.timestamp)
                    .with_context(|| format!("Invalid message timestamp: {}", record.timestamp))?
                    .with_timezone(&Utc);
                Ok(ChannelMessage {
                    content: record.content,
                    created_at,
                })
            })
            .collect()
    }

    async fn send(
        &self,
        channel_id: u64,
        text: &str,
        allow_broadcast_mentions: bool,
    ) -> Result<()> {
        let url = format!("{}/channels/{}/messages", API_BASE, channel_id);
        let allowed_mentions = if allow_broadcast_mentions {
            serde_json::json!({ "parse": ["everyone", "roles", "users"] })
        } else {
            serde_json::json!({ "parse": [] })
        };
        let body = serde_json::json!({
            "content": text,
            "allowed_mentions": allowed_mentions,
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Send to channel {} failed", channel_id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to post message to channel {}: {}",
                channel_id,
                response.status()
            );
        }

        Ok(())
    }
}
