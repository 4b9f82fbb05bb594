// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub prober: ProberConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub responder: ResponderConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Display label. Falls back to the URL host when omitted.
    #[serde(default)]
    pub name: Option<String>,
    pub url: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProberConfig {
    #[serde(default = "default_probe_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_jitter_min")]
    pub jitter_min_secs: u64,

    #[serde(default = "default_jitter_max")]
    pub jitter_max_secs: u64,
}

impl ProberConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn jitter(&self) -> JitterRange {
        JitterRange::new(
            Duration::from_secs(self.jitter_min_secs),
            Duration::from_secs(self.jitter_max_secs),
        )
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_probe_interval(),
            timeout_secs: default_probe_timeout(),
            jitter_min_secs: default_jitter_min(),
            jitter_max_secs: default_jitter_max(),
        }
    }
}

/// Inclusive range the first probe delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    pub min: Duration,
    pub max: Duration,
}

impl JitterRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Uniform sample in `[min, max]` at millisecond resolution.
    pub fn sample(&self) -> Duration {
        use rand::Rng;

        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_render_interval")]
    pub interval_secs: u64,

    /// Offset used for the timestamps shown on the display. Defaults to IST.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_title")]
    pub title: String,
}

impl RendererConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn offset(&self) -> Option<chrono::FixedOffset> {
        chrono::FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_render_interval(),
            utc_offset_minutes: default_utc_offset(),
            title: default_title(),
        }
    }
}

/// Location of the pre-existing message the renderer edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub channel_id: Option<u64>,

    #[serde(default)]
    pub message_id: Option<u64>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: Option<String>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_responder_port")]
    pub port: u16,

    #[serde(default = "default_responder_message")]
    pub message: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_responder_port(),
            message: default_responder_message(),
            metrics_path: default_metrics_path(),
        }
    }
}

/// Roles allowed through [`crate::gateway::CommandGateway`].
///
/// The binary has no inbound command transport, so this section only takes
/// effect when an embedding application builds a `CommandGateway` from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            privileged_roles: default_privileged_roles(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one endpoint must be configured")]
    NoEndpoints,

    #[error("endpoint {0} must use http or https")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("jitter_min_secs ({min}) exceeds jitter_max_secs ({max})")]
    InvalidJitter { min: u64, max: u64 },

    #[error("utc_offset_minutes {0} is outside +/-24h")]
    InvalidOffset(i32),

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        for endpoint in &self.endpoints {
            if !matches!(endpoint.url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme(endpoint.url.to_string()));
            }
        }

        if self.prober.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("prober.interval_secs"));
        }
        if self.prober.timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("prober.timeout_secs"));
        }
        if self.renderer.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("renderer.interval_secs"));
        }
        if self.prober.jitter_min_secs > self.prober.jitter_max_secs {
            return Err(ConfigError::InvalidJitter {
                min: self.prober.jitter_min_secs,
                max: self.prober.jitter_max_secs,
            });
        }
        if self.renderer.offset().is_none() {
            return Err(ConfigError::InvalidOffset(self.renderer.utc_offset_minutes));
        }

        Ok(())
    }
}

fn default_probe_interval() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_jitter_min() -> u64 {
    120
}

fn default_jitter_max() -> u64 {
    300
}

fn default_render_interval() -> u64 {
    10
}

fn default_utc_offset() -> i32 {
    330
}

fn default_title() -> String {
    "UPTIME MONITOR".to_string()
}

fn default_true() -> bool {
    true
}

fn default_responder_port() -> u16 {
    8080
}

fn default_responder_message() -> String {
    "Uptime Bot is Running!".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_privileged_roles() -> Vec<String> {
    vec!["ROOT".to_string(), "MOD".to_string()]
}
