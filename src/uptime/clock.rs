// src/uptime/clock.rs
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// When the monitored session became ready. Set once, never reset.
///
/// The wall-clock time only labels the start; elapsed time is measured from
/// the monotonic anchor so clock steps never move the uptime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionClock {
    started_at: Option<DateTime<Utc>>,
    anchor: Option<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_start(&mut self) -> bool {
        self.mark_start_at(Utc::now(), Instant::now())
    }

    /// Returns false, leaving the clock untouched, if it was already set.
    pub fn mark_start_at(&mut self, wall: DateTime<Utc>, anchor: Instant) -> bool {
        if self.anchor.is_some() {
            return false;
        }
        self.started_at = Some(wall);
        self.anchor = Some(anchor);
        true
    }

    pub fn is_set(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// `max(0, now - anchor)`, or zero when the clock was never set.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => now.saturating_duration_since(anchor),
            None => Duration::ZERO,
        }
    }
}

/// Elapsed session time split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uptime {
    pub total: Duration,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Uptime {
    pub fn from_duration(total: Duration) -> Self {
        let secs = total.as_secs();
        Self {
            total,
            days: secs / 86_400,
            hours: secs % 86_400 / 3_600,
            minutes: secs % 3_600 / 60,
            seconds: secs % 60,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
