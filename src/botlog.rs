// ABOUTME: Operator log sink: always writes to process output, mirrors to a channel when configured
// ABOUTME: An unreachable log channel degrades to console-only logging

use crate::traits::ChatTransport;
use std::sync::Arc;

/// Mirrors operator-facing lifecycle lines to a configured log channel.
/// Structured diagnostics still go through tracing directly; this carries
/// the lines an operator watches from chat.
#[derive(Clone)]
pub struct BotLogger {
    transport: Arc<dyn ChatTransport>,
    log_channel_id: Option<u64>,
}

impl BotLogger {
    pub fn new(transport: Arc<dyn ChatTransport>, log_channel_id: Option<u64>) -> Self {
        Self {
            transport,
            log_channel_id,
        }
    }

    pub async fn log(&self, line: &str) {
        tracing::info!("{}", line);
        self.mirror(line).await;
    }

    pub async fn error(&self, line: &str) {
        tracing::error!("{}", line);
        self.mirror(line).await;
    }

    async fn mirror(&self, line: &str) {
        let Some(channel_id) = self.log_channel_id else {
            return;
        };
        if let Err(e) = self.transport.send(channel_id, line, false).await {
            tracing::warn!(
                error = %e,
                channel_id,
                "Log channel unreachable, continuing console-only"
            );
        }
    }
}
