// src/metrics/collector.rs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,
    pub endpoint_up: IntGaugeVec,

    // Render metrics
    pub render_cycles_total: IntCounterVec,

    // Session
    pub uptime_seconds: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("pinger_probes_total", "Total endpoint probes"),
            &["endpoint", "outcome"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pinger_probe_duration_seconds",
                "Endpoint probe duration in seconds",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let endpoint_up = IntGaugeVec::new(
            Opts::new(
                "pinger_endpoint_up",
                "Endpoint status (1=online, 0=offline)",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(endpoint_up.clone()))?;

        let render_cycles_total = IntCounterVec::new(
            Opts::new("pinger_render_cycles_total", "Total render cycles"),
            &["outcome"],
        )?;
        registry.register(Box::new(render_cycles_total.clone()))?;

        let uptime_seconds =
            IntGauge::new("pinger_uptime_seconds", "Seconds since the session became ready")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            endpoint_up,
            render_cycles_total,
            uptime_seconds,
        })
    }

    pub fn record_probe(&self, endpoint: &str, online: bool, duration: Duration) {
        let outcome = if online { "online" } else { "offline" };
        self.probes_total
            .with_label_values(&[endpoint, outcome])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[endpoint])
            .observe(duration.as_secs_f64());

        self.endpoint_up
            .with_label_values(&[endpoint])
            .set(if online { 1 } else { 0 });
    }

    pub fn record_render(&self, outcome: &str) {
        self.render_cycles_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn set_uptime(&self, uptime: Duration) {
        self.uptime_seconds.set(uptime.as_secs() as i64);
    }
}
