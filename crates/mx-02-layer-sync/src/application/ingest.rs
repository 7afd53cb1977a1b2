//! The single ingestion path shared by live sync and backfill.

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use mx_telemetry::metrics::NODE_ERRORS;
use shared_types::LayerNumber;
use tracing::{debug, warn};

use crate::domain::{LayerSnapshot, SyncError};
use crate::ports::NodeClient;

/// Fetches layers from the node and writes them through the store.
pub struct LayerIngestor {
    node: Arc<dyn NodeClient>,
    store: Arc<dyn EntityStore>,
    atx_sync: bool,
}

impl LayerIngestor {
    pub fn new(node: Arc<dyn NodeClient>, store: Arc<dyn EntityStore>, atx_sync: bool) -> Self {
        Self {
            node,
            store,
            atx_sync,
        }
    }

    pub fn node(&self) -> &Arc<dyn NodeClient> {
        &self.node
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Fetch one layer from the node.
    pub async fn fetch(&self, number: LayerNumber) -> Result<LayerSnapshot, SyncError> {
        self.node.layer(number).await.map_err(|e| {
            NODE_ERRORS.with_label_values(&[e.kind()]).inc();
            warn!(layer = number, error = %e, "[mx-02] node refused layer");
            SyncError::from(e)
        })
    }

    /// Write a snapshot. The layer record goes last: its presence means
    /// every other record of the layer is stored.
    ///
    /// Any failure leaves the layer record absent, and retrying the whole
    /// snapshot is safe because every write is an upsert.
    pub async fn ingest(&self, snapshot: &LayerSnapshot) -> Result<(), SyncError> {
        for block in &snapshot.blocks {
            self.store.put_block(block).await?;
        }
        for tx in &snapshot.transactions {
            self.store.put_transaction(tx).await?;
        }
        if self.atx_sync {
            for activation in &snapshot.activations {
                self.store.upsert_activation(activation).await?;
            }
        }
        for reward in &snapshot.rewards {
            self.store.upsert_reward(reward).await?;
        }
        for account in &snapshot.accounts {
            self.store.upsert_account(account).await?;
        }
        self.store.put_layer(&snapshot.layer).await?;

        debug!(
            layer = snapshot.number(),
            transactions = snapshot.transactions.len(),
            activations = snapshot.activations.len(),
            "[mx-02] layer stored"
        );
        Ok(())
    }

    /// Fetch and store one layer.
    pub async fn apply(&self, number: LayerNumber) -> Result<(), SyncError> {
        let snapshot = self.fetch(number).await?;
        self.ingest(&snapshot).await
    }
}
