// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON), then layer environment overrides on top.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let mut config = parse_config(&contents, is_yaml)?;

    config
        .apply_env_overrides(|var| std::env::var(var).ok())
        .context("Invalid environment override")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn parse_config(contents: &str, yaml: bool) -> Result<Config> {
    let config = if yaml {
        serde_yaml::from_str(contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}

impl Config {
    /// `TOKEN`, `CHANNEL_ID` and `MESSAGE_ID` keep the names the bot's `.env` files already use.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TOKEN").filter(|t| !t.trim().is_empty()) {
            self.session.token = Some(token.trim().to_string());
        }
        if let Some(channel) = lookup("CHANNEL_ID") {
            self.display.channel_id = Some(parse_env("CHANNEL_ID", &channel)?);
        }
        if let Some(message) = lookup("MESSAGE_ID") {
            self.display.message_id = Some(parse_env("MESSAGE_ID", &message)?);
        }
        if let Some(port) = lookup("PINGER_PORT") {
            self.responder.port = parse_env("PINGER_PORT", &port)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
