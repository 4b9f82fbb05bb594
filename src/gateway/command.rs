// src/gateway/command.rs
use super::permission::{is_admin_or_privileged, Identity};
use crate::config::GatewayConfig;
use crate::sink::{NoticeSink, SendOutcome};
use std::sync::Arc;
use tracing::{info, warn};

pub const DENIAL_MESSAGE: &str = "You don't have permission to use this command.";

const PURPLE: u32 = 0x9b59b6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: String,
}

impl Notice {
    /// The fixed notice the `saym` command posts.
    pub fn sample() -> Self {
        Self {
            title: "\u{1F4E6} Dummy Embed".to_string(),
            description: "This is a sample embed sent by the bot.".to_string(),
            color: PURPLE,
            footer: "Sent by /saym command".to_string(),
        }
    }
}

/// Reply shown to the invoking actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    Sent { destination: u64 },
    Denied,
    InvalidDestination,
    Failed(String),
}

impl GatewayReply {
    pub fn message(&self) -> String {
        match self {
            Self::Sent { destination } => format!("Embed sent to <#{}>.", destination),
            Self::Denied => DENIAL_MESSAGE.to_string(),
            Self::InvalidDestination => "Invalid channel ID.".to_string(),
            Self::Failed(reason) => format!("Failed to send embed: `{}`", reason),
        }
    }
}

pub struct CommandGateway {
    privileged_roles: Vec<String>,
    sink: Arc<dyn NoticeSink>,
}

impl CommandGateway {
    pub fn new(config: &GatewayConfig, sink: Arc<dyn NoticeSink>) -> Self {
        Self {
            privileged_roles: config.privileged_roles.clone(),
            sink,
        }
    }

    pub fn is_authorized(&self, identity: &Identity) -> bool {
        is_admin_or_privileged(identity, &self.privileged_roles)
    }

    /// `destination` is the raw channel id as typed by the actor.
    pub async fn send_notice(&self, identity: &Identity, destination: &str) -> GatewayReply {
        if !self.is_authorized(identity) {
            warn!(actor = %identity.name, "Denied notice command");
            return GatewayReply::Denied;
        }

        let Ok(channel) = destination.trim().parse::<u64>() else {
            return GatewayReply::InvalidDestination;
        };

        match self.sink.send(channel, &Notice::sample()).await {
            Ok(SendOutcome::Sent) => {
                info!(actor = %identity.name, channel, "Notice sent");
                GatewayReply::Sent {
                    destination: channel,
                }
            }
            Ok(SendOutcome::UnknownDestination) => GatewayReply::InvalidDestination,
            Err(e) => GatewayReply::Failed(e.to_string()),
        }
    }
}
