// src/renderer/payload.rs
use crate::state::RenderSnapshot;
use crate::status::EndpointState;
use crate::uptime::Uptime;
use chrono::{DateTime, FixedOffset};

const CLOCK_FORMAT: &str = "%I:%M:%S %p";

/// What one render cycle pushes to the display. Built fresh every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayPayload {
    pub title: String,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub uptime: Uptime,
    pub updated_at: DateTime<FixedOffset>,
    pub endpoints: Vec<(String, EndpointState)>,
}

impl DisplayPayload {
    /// Endpoints keep the order of `names`; names missing from the snapshot show as unknown.
    pub fn build<'a>(
        title: &str,
        snapshot: &RenderSnapshot,
        names: impl IntoIterator<Item = &'a str>,
        offset: FixedOffset,
    ) -> Self {
        let endpoints = names
            .into_iter()
            .map(|name| {
                let state = snapshot.statuses.state(name).unwrap_or_default();
                (name.to_string(), state)
            })
            .collect();

        Self {
            title: title.to_string(),
            started_at: snapshot.started_at.map(|t| t.with_timezone(&offset)),
            uptime: snapshot.uptime,
            updated_at: snapshot.taken_at.with_timezone(&offset),
            endpoints,
        }
    }

    pub fn started_label(&self) -> String {
        match self.started_at {
            Some(t) => t.format(CLOCK_FORMAT).to_string(),
            None => "not started".to_string(),
        }
    }

    pub fn updated_label(&self) -> String {
        self.updated_at.format(CLOCK_FORMAT).to_string()
    }

    /// e.g. `UTC+05:30`
    pub fn zone_label(&self) -> String {
        format!("UTC{}", self.updated_at.offset())
    }

    pub fn all_online(&self) -> bool {
        self.endpoints
            .iter()
            .all(|(_, state)| *state == EndpointState::Online)
    }
}
