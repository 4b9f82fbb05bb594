// src/sink/console.rs
use super::{DisplayHandle, DisplaySink, DisplayTarget, NoticeSink, SendOutcome, SinkError};
use crate::gateway::Notice;
use crate::renderer::DisplayPayload;
use async_trait::async_trait;
use tracing::info;

/// Writes payloads to the log. Used when no session token is configured.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DisplaySink for ConsoleSink {
    async fn locate(&self, target: &DisplayTarget) -> Result<Option<DisplayHandle>, SinkError> {
        Ok(Some(DisplayHandle {
            channel_id: target.channel_id,
            message_id: target.message_id,
        }))
    }

    async fn update(
        &self,
        _handle: &DisplayHandle,
        payload: &DisplayPayload,
    ) -> Result<(), SinkError> {
        let endpoints = payload
            .endpoints
            .iter()
            .map(|(name, state)| format!("{}={}", name, state))
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            title = %payload.title,
            started = %payload.started_label(),
            uptime = %payload.uptime,
            updated = %payload.updated_label(),
            "{}",
            endpoints
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[async_trait]
impl NoticeSink for ConsoleSink {
    async fn send(&self, destination: u64, notice: &Notice) -> Result<SendOutcome, SinkError> {
        info!(destination, title = %notice.title, "{}", notice.description);
        Ok(SendOutcome::Sent)
    }
}
