// src/scheduler/supervisor.rs
use super::task::{Cycle, PeriodicTask};
use crate::config::{JitterRange, ProberConfig, RendererConfig};
use crate::state::SharedState;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    NotReady,
    Ready,
    Running,
}

/// Owns the probe and render tasks and defers both until the display
/// session is ready.
pub struct Supervisor {
    state: SharedState,
    prober: Arc<dyn Cycle>,
    renderer: Arc<dyn Cycle>,
    probe_task: PeriodicTask,
    render_task: PeriodicTask,
    jitter: JitterRange,
    lifecycle: watch::Sender<Lifecycle>,
}

impl Supervisor {
    pub fn new(
        state: SharedState,
        prober: Arc<dyn Cycle>,
        renderer: Arc<dyn Cycle>,
        prober_config: &ProberConfig,
        renderer_config: &RendererConfig,
    ) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::NotReady);
        Self {
            state,
            probe_task: PeriodicTask::new(prober.name(), prober_config.interval()),
            render_task: PeriodicTask::new(renderer.name(), renderer_config.interval()),
            prober,
            renderer,
            jitter: prober_config.jitter(),
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Safe to call on every (re)connect: the clock is marked once and a task
    /// is only started when it is not already running.
    pub async fn on_session_ready(&self) -> Lifecycle {
        let first = self.lifecycle.send_if_modified(|state| {
            if *state == Lifecycle::NotReady {
                *state = Lifecycle::Ready;
                true
            } else {
                false
            }
        });

        if first {
            self.state.mark_start().await;
            info!("Session ready, starting periodic tasks");
        } else {
            debug!("Session ready again, keeping existing tasks");
        }

        if !self.probe_task.is_running() {
            let delay = self.jitter.sample();
            info!("First probe cycle in {}s", delay.as_secs());
            self.probe_task.start(delay, self.prober.clone());
        }
        if !self.render_task.is_running() {
            self.render_task.start(Duration::ZERO, self.renderer.clone());
        }

        self.lifecycle.send_replace(Lifecycle::Running);
        Lifecycle::Running
    }

    /// Resolves once `on_session_ready` has started the tasks.
    pub async fn wait_running(&self) {
        let mut rx = self.lifecycle.subscribe();
        let _ = rx.wait_for(|state| *state == Lifecycle::Running).await;
    }

    pub fn probe_task(&self) -> &PeriodicTask {
        &self.probe_task
    }

    pub fn render_task(&self) -> &PeriodicTask {
        &self.render_task
    }

    pub async fn shutdown(&self) {
        self.probe_task.shutdown().await;
        self.render_task.shutdown().await;
        info!("Supervisor stopped");
    }
}
