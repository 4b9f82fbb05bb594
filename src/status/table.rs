// src/status/table.rs
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointState {
    #[default]
    Unknown,
    Checking,
    Online,
    Offline,
}

impl EndpointState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    /// True once a probe has produced a verdict for the endpoint.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Online | Self::Offline)
    }
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current health of one endpoint. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointStatus {
    pub state: EndpointState,
    pub last_checked: Option<DateTime<Utc>>,
    pub http_status: Option<u16>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl EndpointStatus {
    pub fn online(http_status: u16, latency_ms: u64) -> Self {
        Self {
            state: EndpointState::Online,
            last_checked: Some(Utc::now()),
            http_status: Some(http_status),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn offline(http_status: Option<u16>, latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            state: EndpointState::Offline,
            last_checked: Some(Utc::now()),
            http_status,
            latency_ms: Some(latency_ms),
            error: Some(error.into()),
        }
    }

    fn checking() -> Self {
        Self {
            state: EndpointState::Checking,
            ..Self::default()
        }
    }
}

/// Endpoint name to current status. Holds no lock itself; see `SharedState`.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    entries: BTreeMap<String, EndpointStatus>,
}

impl StatusTable {
    /// Seeds one `Unknown` entry per name.
    pub fn with_endpoints<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| (name.to_string(), EndpointStatus::default()))
            .collect();
        Self { entries }
    }

    pub fn write(&mut self, name: &str, status: EndpointStatus) {
        match self.entries.get_mut(name) {
            Some(entry) => *entry = status,
            None => {
                self.entries.insert(name.to_string(), status);
            }
        }
    }

    /// Moves every `Unknown` entry to `Checking`. Returns how many moved.
    pub fn mark_checking(&mut self) -> usize {
        let mut moved = 0;
        for entry in self.entries.values_mut() {
            if entry.state == EndpointState::Unknown {
                *entry = EndpointStatus::checking();
                moved += 1;
            }
        }
        moved
    }

    pub fn get(&self, name: &str) -> Option<&EndpointStatus> {
        self.entries.get(name)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            entries: self.entries.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owned point-in-time copy of the table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    entries: BTreeMap<String, EndpointStatus>,
}

impl StatusSnapshot {
    pub fn get(&self, name: &str) -> Option<&EndpointStatus> {
        self.entries.get(name)
    }

    pub fn state(&self, name: &str) -> Option<EndpointState> {
        self.entries.get(name).map(|s| s.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointStatus)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn count(&self, state: EndpointState) -> usize {
        self.entries.values().filter(|s| s.state == state).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
