// src/state/mod.rs
//
// Status table and session clock behind one mutex. Every critical section is
// short and never spans network I/O.

use crate::registry::EndpointRegistry;
use crate::status::{EndpointStatus, StatusSnapshot, StatusTable};
use crate::uptime::{SessionClock, Uptime};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MonitorState {
    table: StatusTable,
    clock: SessionClock,
}

/// Everything a render cycle needs, captured under one lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub statuses: StatusSnapshot,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime: Uptime,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<MonitorState>>,
}

impl SharedState {
    pub fn new(registry: &EndpointRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorState {
                table: StatusTable::with_endpoints(registry.names()),
                clock: SessionClock::new(),
            })),
        }
    }

    pub async fn write(&self, name: &str, status: EndpointStatus) {
        self.inner.lock().await.table.write(name, status);
    }

    pub async fn mark_checking(&self) -> usize {
        self.inner.lock().await.table.mark_checking()
    }

    pub async fn read_snapshot(&self) -> StatusSnapshot {
        self.inner.lock().await.table.snapshot()
    }

    pub async fn mark_start(&self) -> bool {
        self.inner.lock().await.clock.mark_start()
    }

    pub async fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.clock.started_at()
    }

    pub async fn elapsed(&self) -> Duration {
        self.inner.lock().await.clock.elapsed()
    }

    pub async fn render_snapshot(&self) -> RenderSnapshot {
        let state = self.inner.lock().await;
        RenderSnapshot {
            statuses: state.table.snapshot(),
            started_at: state.clock.started_at(),
            uptime: Uptime::from_duration(state.clock.elapsed()),
            taken_at: Utc::now(),
        }
    }
}
