//! MicroMonitor panel host
//!
//! Follows every running container reported by the telemetry API and
//! exposes the reconciled log and metrics panels to a view layer.

use anyhow::{Context, Result};
use micromonitor_panel::{api, HostConfig, PanelHost};
use monitor_lib::{
    health::{components, HealthRegistry},
    observability::{MonitorMetrics, StructuredLogger},
    poller::PollingScheduler,
    CostProjectionEngine, HttpTelemetryClient, PricingTable, TelemetryApi,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PANEL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting micromonitor-panel");

    let config = HostConfig::load()?;
    info!(api_url = %config.api_url, port = config.port, "Panel host configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SUBJECT_DISCOVERY).await;
    health_registry.register(components::PRICING).await;

    let pricing = match PricingTable::load_or_default(config.pricing_file.as_deref()) {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "Pricing catalogue rejected, using default rates");
            health_registry
                .set_degraded(components::PRICING, e.to_string())
                .await;
            PricingTable::default()
        }
    };
    let engine = CostProjectionEngine::new(Arc::new(pricing));

    let metrics = MonitorMetrics::new();
    let logger = StructuredLogger::new(&config.instance);
    logger.log_startup(PANEL_VERSION, &config.api_url);

    let client = HttpTelemetryClient::new(&config.api_url).context("Invalid telemetry API URL")?;
    let api: Arc<dyn TelemetryApi> = Arc::new(client);

    let host = Arc::new(PanelHost::new(
        api,
        config.panel_config(),
        metrics.clone(),
        logger.clone(),
    ));

    let scheduler = PollingScheduler::new(metrics.clone());
    let mut discovery =
        host.start_discovery(&scheduler, config.subjects_interval(), health_registry.clone());

    let app_state = Arc::new(api::AppState::new(
        health_registry,
        metrics,
        host.clone(),
        engine,
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let api_handle = tokio::spawn(api::serve(config.port, app_state, async move {
        let _ = shutdown_rx.await;
    }));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    discovery.stop();
    host.shutdown();
    let _ = shutdown_tx.send(());

    match api_handle.await {
        Ok(result) => result?,
        Err(e) => warn!(error = %e, "API server task failed"),
    }

    info!("Shut down");
    Ok(())
}
