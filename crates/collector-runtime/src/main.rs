//! # explorer-collector
//!
//! Entry point. See the library crate docs for the startup sequence.

use std::sync::Arc;

use anyhow::{Context, Result};
use collector_runtime::{join_all, shutdown_signal, Collector, CollectorConfig, ProcessMarker};
use mx_01_entity_store::{EntityStoreService, RocksDbBackend, RocksDbConfig};
use mx_02_layer_sync::JsonRpcNodeClient;
use mx_telemetry::{init_telemetry, TelemetryConfig};
use shared_types::Classify;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let result = run().await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "[runtime] fatal startup failure");
    }
    result
}

async fn run() -> Result<()> {
    let config = CollectorConfig::load().context("invalid configuration")?;
    info!(
        node = %config.node_public,
        store = %config.store_path.join(&config.db).display(),
        version = collector_runtime::VERSION,
        "[runtime] starting explorer collector"
    );

    let backend = RocksDbBackend::open(RocksDbConfig::at(&config.store_path, &config.db))
        .context("failed to open entity store")?;
    let store = Arc::new(EntityStoreService::new(
        Arc::new(backend),
        config.store.clone(),
    ));
    let node = Arc::new(JsonRpcNodeClient::new(
        &config.node_public,
        &config.node_private,
        &config.hrp,
        config.node_timeout,
    ));

    let collector = Collector::build(config.clone(), store, node)
        .await
        .context("failed to fetch network info from node")?;
    collector
        .prepare()
        .await
        .context("epoch statistics recalculation failed")?;

    let _marker = match ProcessMarker::create(&config.marker_file) {
        Ok(marker) => Some(marker),
        Err(e) => {
            warn!(error = %e, class = %e.class(), "[runtime] running without process marker");
            None
        }
    };

    let api = TcpListener::bind(config.api_addr)
        .await
        .with_context(|| format!("failed to bind search API on {}", config.api_addr))?;
    let metrics = TcpListener::bind(config.metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics on {}", config.metrics_addr))?;

    let tasks = collector.start(api, metrics);
    info!("Collector is running. Press Ctrl+C to stop.");
    shutdown_signal().await;

    collector.shutdown();
    join_all(tasks).await;
    info!("[runtime] shutdown complete");
    Ok(())
}
