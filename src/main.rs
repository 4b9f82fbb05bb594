// src/main.rs
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use uptime_pinger::{
    config,
    metrics::MetricsRegistry,
    prober::Prober,
    registry::EndpointRegistry,
    renderer::Renderer,
    scheduler::Supervisor,
    server::{LivenessHandler, ServerBuilder},
    sink::{ConsoleSink, DiscordSink, DisplaySink, DisplayTarget},
    state::SharedState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uptime_pinger=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let registry = EndpointRegistry::from_config(&config.endpoints)?;
    info!("Monitoring {} endpoints", registry.len());
    let state = SharedState::new(&registry);

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start liveness responder if enabled
    let responder = if config.responder.enabled {
        let addr: SocketAddr = ([0, 0, 0, 0], config.responder.port).into();
        let handler = LivenessHandler::new(config.responder.message.clone())
            .with_metrics(config.responder.metrics_path.clone(), metrics_registry.clone());
        let server = ServerBuilder::new(addr).with_handler(handler).bind().await?;

        let mut stop = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let signal = async move {
                let _ = stop.wait_for(|stopped| *stopped).await;
            };
            if let Err(e) = server.serve_with_shutdown(signal).await {
                error!("Liveness responder error: {}", e);
            }
        }))
    } else {
        None
    };

    // Establish the display session
    let configured_target = DisplayTarget::from_config(&config.display);
    let (sink, target): (Arc<dyn DisplaySink>, Option<DisplayTarget>) =
        match &config.session.token {
            Some(token) => {
                let discord = DiscordSink::new(token.clone())?;
                let session = discord
                    .connect()
                    .await
                    .context("Failed to establish Discord session")?;
                info!("Logged in as {} ({})", session.username, session.id);
                if configured_target.is_none() {
                    warn!("CHANNEL_ID/MESSAGE_ID not set; the status message will not be updated");
                }
                (Arc::new(discord) as Arc<dyn DisplaySink>, configured_target)
            }
            None => {
                warn!("No session token configured, rendering status to the log");
                let target = configured_target.unwrap_or(DisplayTarget {
                    channel_id: 0,
                    message_id: 0,
                });
                (Arc::new(ConsoleSink::new()) as Arc<dyn DisplaySink>, Some(target))
            }
        };

    let prober = Arc::new(Prober::new(
        &config.prober,
        registry.clone(),
        state.clone(),
        Some(metrics.clone()),
    )?);
    let renderer = Arc::new(Renderer::new(
        &config.renderer,
        registry,
        state.clone(),
        sink,
        target,
        Some(metrics),
    ));

    let supervisor = Supervisor::new(
        state,
        prober,
        renderer,
        &config.prober,
        &config.renderer,
    );
    supervisor.on_session_ready().await;

    shutdown_signal().await;

    let _ = shutdown_tx.send(true);
    supervisor.shutdown().await;
    if let Some(responder) = responder {
        if let Err(e) = responder.await {
            error!("Liveness responder join error: {}", e);
        }
    }

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
