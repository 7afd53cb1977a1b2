//! # Sync Engine
//!
//! Cursor-driven live sync. Layers are applied in strictly increasing order
//! and the watermark moves only after a layer is fully stored.
//!
//! ## Per-layer step
//!
//! ```text
//! fetch(n) ──→ n opens an epoch? ──yes──→ recalculate(epoch(n) - 1)
//!                     │                           │
//!                     no                          │
//!                     ▼                           ▼
//!                ingest(n) ──→ advance_watermark(n) ──→ cursor = n + 1
//! ```

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use mx_telemetry::metrics::{
    HistogramTimer, NODE_ERRORS, SYNC_LAYERS_APPLIED, SYNC_LAYER_DURATION, SYNC_WATERMARK,
};
use parking_lot::Mutex;
use shared_types::{LayerNumber, LayerRange, NetworkInfo, SyncState};
use tracing::{debug, info};

use crate::application::{LayerIngestor, StatsRecalculator};
use crate::config::SyncConfig;
use crate::domain::SyncError;

pub struct SyncEngine {
    ingestor: Arc<LayerIngestor>,
    stats: Arc<StatsRecalculator>,
    network: NetworkInfo,
    config: SyncConfig,
    /// Next layer to apply. Unset until the first `advance()`.
    cursor: Mutex<Option<LayerNumber>>,
}

impl SyncEngine {
    pub fn new(
        ingestor: Arc<LayerIngestor>,
        stats: Arc<StatsRecalculator>,
        network: NetworkInfo,
        config: SyncConfig,
    ) -> Self {
        Self {
            ingestor,
            stats,
            network,
            config,
            cursor: Mutex::new(None),
        }
    }

    fn store(&self) -> &Arc<dyn EntityStore> {
        self.ingestor.store()
    }

    /// Next layer live sync will request.
    pub fn cursor(&self) -> Option<LayerNumber> {
        *self.cursor.lock()
    }

    /// Work done once before live sync starts: the forced full epoch
    /// statistics pass when configured.
    pub async fn prepare(&self) -> Result<(), SyncError> {
        if !self.config.recalculate_epoch_stats {
            return Ok(());
        }
        let state = self.store().sync_state().await?;
        let last = self.network.epoch_of(state.watermark_or_zero());
        let done = self.stats.recalculate_through(last).await?;
        info!(epochs = done, "[mx-02] forced epoch stats recalculation complete");
        Ok(())
    }

    /// Apply up to `max_layers_per_advance` layers. Returns how many were
    /// applied; `Ok(0)` means caught up with the node.
    ///
    /// On error nothing past the last fully stored layer is committed and the
    /// cursor stays on the failed layer.
    pub async fn advance(&self) -> Result<u32, SyncError> {
        let mut next = self.resolve_cursor().await?;
        let highest = self.ingestor.node().highest_layer().await.map_err(|e| {
            NODE_ERRORS.with_label_values(&[e.kind()]).inc();
            SyncError::from(e)
        })?;

        let mut applied = 0;
        while applied < self.config.max_layers_per_advance && next <= highest {
            let state = self.apply_layer(next).await?;
            applied += 1;

            SYNC_LAYERS_APPLIED.inc();
            SYNC_WATERMARK.set(i64::from(state.watermark_or_zero()));

            match next.checked_add(1) {
                Some(following) => {
                    next = following;
                    *self.cursor.lock() = Some(next);
                }
                None => break,
            }
        }

        if applied > 0 {
            debug!(applied, next, highest, "[mx-02] advanced");
        }
        Ok(applied)
    }

    async fn apply_layer(&self, number: LayerNumber) -> Result<SyncState, SyncError> {
        let _timer = HistogramTimer::new(&SYNC_LAYER_DURATION);

        let snapshot = self.ingestor.fetch(number).await?;
        if self.network.is_first_layer_of_epoch(number) {
            let completed = self.network.epoch_of(number) - 1;
            self.stats.recalculate(completed).await?;
        }
        self.ingestor.ingest(&snapshot).await?;
        Ok(self.store().advance_watermark(number).await?)
    }

    /// Cursor from memory, or from the stored watermark and the start-layer
    /// override on first use.
    async fn resolve_cursor(&self) -> Result<LayerNumber, SyncError> {
        if let Some(cursor) = self.cursor() {
            return Ok(cursor);
        }

        let state = self.store().sync_state().await?;
        let stored_next = state.next_layer();
        let start = match self.config.start_layer {
            Some(start) if start > stored_next => {
                let skipped = LayerRange::new(stored_next, start - 1);
                self.store().add_gaps(&[skipped]).await?;
                info!(start, range = %skipped, "[mx-02] start layer skips ahead, range recorded as gap");
                start
            }
            Some(start) => {
                info!(start, watermark = ?state.watermark, "[mx-02] replaying from start layer");
                start
            }
            None => stored_next,
        };

        *self.cursor.lock() = Some(start);
        Ok(start)
    }
}
