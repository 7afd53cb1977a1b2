//! # Collector Runtime
//!
//! Wires the store, the node client and the three components together and
//! owns the shutdown channel.
//!
//! ## Tasks
//!
//! ```text
//!                  ┌──→ Supervisor(LiveSync)   ──┐
//! shutdown (watch) ├──→ GapScanner::run (opt.)  ├──→ JoinSet
//!                  ├──→ search API              │
//!                  └──→ metrics exporter       ──┘
//! ```

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use mx_02_layer_sync::{
    Clock, GapScanner, LayerIngestor, LiveSync, NodeClient, StatsRecalculator, Supervisor,
    SyncEngine, SyncError, TokioClock,
};
use mx_03_search::IdentifierResolver;
use shared_types::NetworkInfo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::CollectorConfig;
use crate::metrics_server;

/// The assembled collector.
pub struct Collector {
    config: CollectorConfig,
    network: NetworkInfo,
    engine: Arc<SyncEngine>,
    scanner: Option<Arc<GapScanner>>,
    resolver: Arc<IdentifierResolver>,
    clock: Arc<dyn Clock>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Collector {
    /// Fetch and validate the network parameters, then build every
    /// component. Failure here is fatal.
    pub async fn build(
        config: CollectorConfig,
        store: Arc<dyn EntityStore>,
        node: Arc<dyn NodeClient>,
    ) -> Result<Self, SyncError> {
        Self::build_with_clock(config, store, node, Arc::new(TokioClock)).await
    }

    pub async fn build_with_clock(
        config: CollectorConfig,
        store: Arc<dyn EntityStore>,
        node: Arc<dyn NodeClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SyncError> {
        let network = node.network_info().await?;
        network.validate()?;
        info!(
            layers_per_epoch = network.layers_per_epoch,
            hrp = %network.hrp,
            "[runtime] network info received"
        );

        let ingestor = Arc::new(LayerIngestor::new(
            node,
            Arc::clone(&store),
            config.sync.atx_sync,
        ));
        let stats = Arc::new(StatsRecalculator::new(
            Arc::clone(&store),
            network.clone(),
        ));
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&ingestor),
            Arc::clone(&stats),
            network.clone(),
            config.sync.clone(),
        ));
        let scanner = config.sync.sync_missing_layers.then(|| {
            Arc::new(GapScanner::new(
                ingestor,
                stats,
                Arc::clone(&clock),
                config.sync.clone(),
            ))
        });
        let resolver = Arc::new(IdentifierResolver::new(store, network.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            network,
            engine,
            scanner,
            resolver,
            clock,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn resolver(&self) -> &Arc<IdentifierResolver> {
        &self.resolver
    }

    /// One-off work before live sync: the forced epoch statistics pass.
    pub async fn prepare(&self) -> Result<(), SyncError> {
        self.engine.prepare().await
    }

    /// Spawn live sync, the gap scanner, the search API and the metrics
    /// exporter.
    pub fn start(&self, api: TcpListener, metrics: TcpListener) -> JoinSet<()> {
        let mut tasks = JoinSet::new();

        let live = LiveSync::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.clock),
            self.config.sync.poll_interval,
        );
        let supervisor = Supervisor::new(self.config.sync.restart_backoff, Arc::clone(&self.clock));
        let shutdown = self.shutdown_rx.clone();
        tasks.spawn(async move { supervisor.run(&live, shutdown).await });

        match &self.scanner {
            Some(scanner) => {
                tasks.spawn(Arc::clone(scanner).run(self.shutdown_rx.clone()));
            }
            None => info!("[runtime] gap scanner disabled"),
        }

        let router = mx_03_search::router(Arc::clone(&self.resolver), &self.config.search);
        let shutdown = self.shutdown_rx.clone();
        tasks.spawn(async move {
            if let Err(e) = mx_03_search::serve(api, router, shutdown).await {
                error!(error = %e, "[mx-03] search API stopped");
            }
        });

        let shutdown = self.shutdown_rx.clone();
        tasks.spawn(async move {
            if let Err(e) = metrics_server::serve(metrics, shutdown).await {
                error!(error = %e, "[runtime] metrics exporter stopped");
            }
        });

        info!("[runtime] collector started");
        tasks
    }

    /// Signal every task to stop taking new work.
    pub fn shutdown(&self) {
        info!("[runtime] initiating graceful shutdown");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("[runtime] failed to send shutdown signal: {}", e);
        }
    }
}

/// Wait for every spawned task to finish.
pub async fn join_all(mut tasks: JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "[runtime] task ended abnormally");
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "[runtime] cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "[runtime] cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("[runtime] Shutdown signal received");
}
