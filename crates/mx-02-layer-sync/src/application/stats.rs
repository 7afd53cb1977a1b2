//! # Stats Recalculator
//!
//! Rebuilds epoch aggregates from stored layer data. Compute first, then
//! swap the epoch record in one put; a failure leaves the old aggregate.

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use mx_telemetry::metrics::STATS_RECALCULATIONS;
use shared_types::{Epoch, EpochNumber, NetworkInfo};
use tracing::{info, warn};

use crate::domain::{compute_epoch_stats, SyncError};

pub struct StatsRecalculator {
    store: Arc<dyn EntityStore>,
    network: NetworkInfo,
}

impl StatsRecalculator {
    pub fn new(store: Arc<dyn EntityStore>, network: NetworkInfo) -> Self {
        Self { store, network }
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    /// Recompute and overwrite one epoch's aggregate.
    pub async fn recalculate(&self, epoch: EpochNumber) -> Result<Epoch, SyncError> {
        let result = self.compute_and_store(epoch).await;
        let outcome = if result.is_ok() { "ok" } else { "failed" };
        STATS_RECALCULATIONS.with_label_values(&[outcome]).inc();

        match &result {
            Ok(record) => info!(
                epoch,
                layers = record.stats.layers,
                transactions = record.stats.transactions,
                smeshers = record.stats.smeshers,
                "[mx-02] epoch stats recalculated"
            ),
            Err(e) => warn!(epoch, error = %e, "[mx-02] epoch stats recalculation failed"),
        }
        result
    }

    /// Recalculate epochs `0..=last`. Stops at the first failure.
    pub async fn recalculate_through(&self, last: EpochNumber) -> Result<u32, SyncError> {
        let mut done = 0;
        for epoch in 0..=last {
            self.recalculate(epoch).await?;
            done += 1;
        }
        Ok(done)
    }

    async fn compute_and_store(&self, epoch: EpochNumber) -> Result<Epoch, SyncError> {
        let range = self.network.epoch_range(epoch);
        let contents = self.store.collect_range(range).await?;

        let record = Epoch {
            number: epoch,
            first_layer: range.start,
            last_layer: range.end,
            stats: compute_epoch_stats(&contents),
        };
        self.store.put_epoch(&record).await?;
        Ok(record)
    }
}
