// ABOUTME: Trait seams between the alert engine and its two remote collaborators
// ABOUTME: ChatTransport covers the messaging platform, StreamingApi the liveness platform

use crate::twitch::{AccessToken, LiveSession, TwitchError};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A message observed in a channel's recent history
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Minimal chat-platform surface the alert engine needs.
///
/// History order is unspecified; consumers must scan the whole window.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch up to `limit` of the most recent messages in a channel
    async fn recent_messages(&self, channel_id: u64, limit: usize) -> Result<Vec<ChannelMessage>>;

    /// Post a message to a channel. `allow_broadcast_mentions` permits
    /// at-large mentions like @everyone in the posted content.
    async fn send(&self, channel_id: u64, text: &str, allow_broadcast_mentions: bool)
        -> Result<()>;
}

/// Streaming-platform surface: credential exchange and batched liveness query
#[async_trait]
pub trait StreamingApi: Send + Sync {
    /// Client-credentials exchange for a fresh bearer token
    async fn obtain_token(&self) -> Result<AccessToken, TwitchError>;

    /// Currently-live sessions among `logins`; offline accounts are absent
    async fn live_streams(
        &self,
        logins: &[String],
        token: &AccessToken,
    ) -> Result<Vec<LiveSession>, TwitchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_message_construction() {
        let msg = ChannelMessage {
            content: "hello".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_transport_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn ChatTransport>) {}
        assert_object_safe(None);
    }

    #[test]
    fn test_streaming_api_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn StreamingApi>) {}
        assert_object_safe(None);
    }
}
