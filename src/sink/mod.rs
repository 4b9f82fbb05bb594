// src/sink/mod.rs
mod console;
mod discord;

pub use console::ConsoleSink;
pub use discord::{DiscordSink, SessionInfo};

use crate::config::DisplayConfig;
use crate::gateway::Notice;
use crate::renderer::DisplayPayload;
use async_trait::async_trait;

/// Where the status message lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTarget {
    pub channel_id: u64,
    pub message_id: u64,
}

impl DisplayTarget {
    pub fn from_config(config: &DisplayConfig) -> Option<Self> {
        Some(Self {
            channel_id: config.channel_id?,
            message_id: config.message_id?,
        })
    }
}

/// A located display resource, valid for one render cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayHandle {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    UnknownDestination,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        SinkError::Transport(e.to_string())
    }
}

#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// `Ok(None)` when the target does not exist (yet).
    async fn locate(&self, target: &DisplayTarget) -> Result<Option<DisplayHandle>, SinkError>;

    async fn update(&self, handle: &DisplayHandle, payload: &DisplayPayload)
        -> Result<(), SinkError>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn send(&self, destination: u64, notice: &Notice) -> Result<SendOutcome, SinkError>;
}
