// src/prober/prober.rs
use crate::config::ProberConfig;
use crate::metrics::MetricsCollector;
use crate::registry::{Endpoint, EndpointRegistry};
use crate::scheduler::Cycle;
use crate::state::SharedState;
use crate::status::EndpointStatus;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Issues one bounded GET per endpoint per cycle and records the verdicts.
pub struct Prober {
    registry: EndpointRegistry,
    state: SharedState,
    client: Client,
    timeout: Duration,
    metrics: Option<Arc<MetricsCollector>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub endpoint: String,
    pub online: bool,
    pub http_status: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn into_status(self) -> EndpointStatus {
        if self.online {
            EndpointStatus::online(self.http_status.unwrap_or_default(), self.latency_ms)
        } else {
            EndpointStatus::offline(
                self.http_status,
                self.latency_ms,
                self.error.unwrap_or_else(|| "unknown failure".to_string()),
            )
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub online: usize,
    pub offline: usize,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.online + self.offline
    }
}

impl Prober {
    pub fn new(
        config: &ProberConfig,
        registry: EndpointRegistry,
        state: SharedState,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            registry,
            state,
            client,
            timeout: config.timeout(),
            metrics,
        })
    }

    /// One probe round across every endpoint. Never fails; each endpoint's
    /// verdict is written as soon as its own request settles.
    pub async fn run_cycle(&self) -> CycleReport {
        let moved = self.state.mark_checking().await;
        if moved > 0 {
            debug!("Marked {} endpoints as checking", moved);
        }

        let checks = self
            .registry
            .all()
            .iter()
            .map(|endpoint| self.probe_and_record(endpoint));
        let outcomes = futures::future::join_all(checks).await;

        let mut report = CycleReport::default();
        for outcome in &outcomes {
            if outcome.online {
                report.online += 1;
            } else {
                report.offline += 1;
            }
        }

        info!(
            "Probe cycle complete: {} online, {} offline",
            report.online, report.offline
        );
        report
    }

    async fn probe_and_record(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let outcome = self.probe(endpoint).await;

        if outcome.online {
            debug!(
                endpoint = %endpoint.name,
                url = %endpoint.url,
                status = ?outcome.http_status,
                latency_ms = outcome.latency_ms,
                "Endpoint online"
            );
        } else {
            warn!(
                endpoint = %endpoint.name,
                url = %endpoint.url,
                error = ?outcome.error,
                "Endpoint offline"
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(
                &endpoint.name,
                outcome.online,
                Duration::from_millis(outcome.latency_ms),
            );
        }

        self.state
            .write(&endpoint.name, outcome.clone().into_status())
            .await;
        outcome
    }

    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let start = Instant::now();

        let result = timeout(self.timeout, self.client.get(endpoint.url.as_str()).send()).await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (online, http_status, error) = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() {
                    (true, Some(status.as_u16()), None)
                } else {
                    (false, Some(status.as_u16()), Some(format!("HTTP {}", status)))
                }
            }
            Ok(Err(e)) if e.is_timeout() => (false, None, Some("Request timeout".to_string())),
            Ok(Err(e)) => (false, None, Some(e.to_string())),
            Err(_) => (false, None, Some("Request timeout".to_string())),
        };

        ProbeOutcome {
            endpoint: endpoint.name.clone(),
            online,
            http_status,
            latency_ms,
            error,
        }
    }
}

#[async_trait]
impl Cycle for Prober {
    async fn run(&self) {
        self.run_cycle().await;
    }

    fn name(&self) -> &'static str {
        "prober"
    }
}
