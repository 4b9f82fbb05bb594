// src/renderer/renderer.rs
use super::DisplayPayload;
use crate::config::RendererConfig;
use crate::metrics::MetricsCollector;
use crate::registry::EndpointRegistry;
use crate::scheduler::Cycle;
use crate::sink::{DisplaySink, DisplayTarget};
use crate::state::SharedState;
use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Updated,
    TargetMissing,
    Failed(String),
}

impl RenderOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::TargetMissing => "target_missing",
            Self::Failed(_) => "failed",
        }
    }
}

pub struct Renderer {
    state: SharedState,
    registry: EndpointRegistry,
    sink: Arc<dyn DisplaySink>,
    target: Option<DisplayTarget>,
    title: String,
    offset: FixedOffset,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Renderer {
    pub fn new(
        config: &RendererConfig,
        registry: EndpointRegistry,
        state: SharedState,
        sink: Arc<dyn DisplaySink>,
        target: Option<DisplayTarget>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        // validate() guarantees the offset; fall back to UTC for hand-built configs
        let offset = config.offset().unwrap_or_else(|| Utc.fix());

        Self {
            state,
            registry,
            sink,
            target,
            title: config.title.clone(),
            offset,
            metrics,
        }
    }

    /// Reads one joint snapshot and pushes it. Sink trouble is reported in the
    /// outcome, never returned as an error.
    pub async fn run_cycle(&self) -> RenderOutcome {
        let outcome = self.render().await;

        match &outcome {
            RenderOutcome::Updated => debug!(sink = self.sink.name(), "Display updated"),
            RenderOutcome::TargetMissing => {
                warn!(display = ?self.target, "Display target not found, skipping render")
            }
            RenderOutcome::Failed(reason) => {
                error!(sink = self.sink.name(), "Display update failed: {}", reason)
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_render(outcome.as_str());
        }
        outcome
    }

    async fn render(&self) -> RenderOutcome {
        let Some(target) = self.target else {
            return RenderOutcome::TargetMissing;
        };

        let snapshot = self.state.render_snapshot().await;
        if let Some(metrics) = &self.metrics {
            metrics.set_uptime(snapshot.uptime.total);
        }

        let payload =
            DisplayPayload::build(&self.title, &snapshot, self.registry.names(), self.offset);

        let handle = match self.sink.locate(&target).await {
            Ok(Some(handle)) => handle,
            Ok(None) => return RenderOutcome::TargetMissing,
            Err(e) => return RenderOutcome::Failed(e.to_string()),
        };

        match self.sink.update(&handle, &payload).await {
            Ok(()) => RenderOutcome::Updated,
            Err(e) => RenderOutcome::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl Cycle for Renderer {
    async fn run(&self) {
        self.run_cycle().await;
    }

    fn name(&self) -> &'static str {
        "renderer"
    }
}
