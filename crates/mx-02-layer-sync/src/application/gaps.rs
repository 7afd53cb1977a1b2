//! # Gap Scanner
//!
//! Finds layers missing below the watermark and backfills them through the
//! same ingestion path as live sync.
//!
//! Backfill races live sync safely: every write is an upsert and backfill
//! never touches the watermark. A range that keeps failing stays in the
//! stored gap list for the next pass. Epochs a backfilled range completes
//! below the watermark get their aggregates rebuilt before the gap closes.

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use mx_telemetry::metrics::{BACKFILL_GAPS_PENDING, BACKFILL_RANGES};
use shared_types::{merge_ranges, missing_ranges, LayerNumber, LayerRange};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::application::{LayerIngestor, StatsRecalculator};
use crate::config::SyncConfig;
use crate::domain::SyncError;
use crate::ports::Clock;

/// Outcome of one backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Ranges fully ingested and removed from the gap list.
    pub closed: Vec<LayerRange>,
    /// Ranges that exhausted their attempts; still recorded as gaps.
    pub failed: Vec<LayerRange>,
}

pub struct GapScanner {
    ingestor: Arc<LayerIngestor>,
    stats: Arc<StatsRecalculator>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
}

impl GapScanner {
    pub fn new(
        ingestor: Arc<LayerIngestor>,
        stats: Arc<StatsRecalculator>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            ingestor,
            stats,
            clock,
            config,
        }
    }

    fn store(&self) -> &Arc<dyn EntityStore> {
        self.ingestor.store()
    }

    /// Recorded gaps plus layers missing from `[0, watermark]`, merged and
    /// ordered.
    pub async fn find_gaps(&self) -> Result<Vec<LayerRange>, SyncError> {
        let state = self.store().sync_state().await?;
        let Some(watermark) = state.watermark else {
            return Ok(merge_ranges(state.gaps));
        };

        let stored = self
            .store()
            .stored_layers(LayerRange::new(0, watermark))
            .await?;
        let missing = missing_ranges(&stored, watermark);

        Ok(merge_ranges(state.gaps.into_iter().chain(missing)))
    }

    /// Find gaps and record them in the sync state.
    pub async fn scan(&self) -> Result<Vec<LayerRange>, SyncError> {
        let gaps = self.find_gaps().await?;
        if !gaps.is_empty() {
            self.store().add_gaps(&gaps).await?;
            info!(count = gaps.len(), first = %gaps[0], "[mx-02] gaps found");
        }
        BACKFILL_GAPS_PENDING.set(gaps.len() as i64);
        Ok(gaps)
    }

    /// Ingest every layer of `range` in order, refresh the completed epochs
    /// it touches, then close it. On ingest failure the already ingested
    /// prefix is closed and the rest stays a gap.
    pub async fn backfill(&self, range: LayerRange) -> Result<(), SyncError> {
        for layer in range.layers() {
            if let Err(e) = self.ingestor.apply(layer).await {
                if layer > range.start {
                    self.store()
                        .close_gap(LayerRange::new(range.start, layer - 1))
                        .await?;
                }
                return Err(e);
            }
        }
        self.refresh_completed_epochs(range).await?;
        self.store().close_gap(range).await?;
        debug!(range = %range, "[mx-02] range backfilled");
        Ok(())
    }

    /// Recalculate every epoch overlapping `range` whose last layer is at or
    /// below the watermark. Open epochs are left to live sync.
    async fn refresh_completed_epochs(&self, range: LayerRange) -> Result<(), SyncError> {
        let Some(watermark) = self.store().sync_state().await?.watermark else {
            return Ok(());
        };
        let network = self.stats.network();
        let top: LayerNumber = range.end.min(watermark);
        if range.start > top {
            return Ok(());
        }

        for epoch in network.epoch_of(range.start)..=network.epoch_of(top) {
            if network.epoch_range(epoch).end <= watermark {
                self.stats.recalculate(epoch).await?;
            }
        }
        Ok(())
    }

    /// Backfill `range`, retrying with backoff up to `max_backfill_attempts`.
    pub async fn backfill_with_retry(&self, range: LayerRange) -> Result<(), SyncError> {
        let attempts = self.config.max_backfill_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.backfill(range).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 >= attempts => {
                    return Err(SyncError::BackfillExhausted {
                        range,
                        attempts,
                        source: Box::new(e),
                    })
                }
                Err(e) => {
                    let delay = self.config.backfill_backoff.delay(attempt);
                    warn!(
                        range = %range,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "[mx-02] backfill attempt failed, retrying"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Backfill ranges concurrently, at most `backfill_workers` at a time.
    pub async fn backfill_all(self: &Arc<Self>, ranges: Vec<LayerRange>) -> BackfillReport {
        let permits = Arc::new(Semaphore::new(self.config.backfill_workers.max(1)));
        let mut tasks = JoinSet::new();

        for range in ranges {
            let scanner = Arc::clone(self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let result = scanner.backfill_with_retry(range).await;
                (range, result)
            });
        }

        let mut report = BackfillReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((range, Ok(()))) => {
                    BACKFILL_RANGES.with_label_values(&["closed"]).inc();
                    report.closed.push(range);
                }
                Ok((range, Err(e))) => {
                    BACKFILL_RANGES.with_label_values(&["failed"]).inc();
                    warn!(range = %range, error = %e, "[mx-02] backfill range left pending");
                    report.failed.push(range);
                }
                Err(e) => warn!(error = %e, "[mx-02] backfill task aborted"),
            }
        }
        report.closed.sort();
        report.failed.sort();
        report
    }

    /// Scan and backfill once.
    pub async fn pass(self: &Arc<Self>) -> Result<BackfillReport, SyncError> {
        let gaps = self.scan().await?;
        if gaps.is_empty() {
            return Ok(BackfillReport::default());
        }
        let report = self.backfill_all(gaps).await;

        let pending = self.store().sync_state().await?.gaps.len();
        BACKFILL_GAPS_PENDING.set(pending as i64);
        info!(
            closed = report.closed.len(),
            failed = report.failed.len(),
            pending,
            "[mx-02] backfill pass complete"
        );
        Ok(report)
    }

    /// Pass on startup, then every `gap_scan_interval` until shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("[mx-02] gap scanner started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.pass().await {
                warn!(error = %e, "[mx-02] gap scan failed");
            }

            tokio::select! {
                _ = self.clock.sleep(self.config.gap_scan_interval) => {}
                _ = shutdown.changed() => {
                    info!("[mx-02] Shutdown signal received");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FakeClock, MockNode};
    use mx_01_entity_store::{EntityStoreService, InMemoryBackend, StoreConfig};
    use shared_types::{LayerNumber, NetworkInfo};

    struct Harness {
        node: Arc<MockNode>,
        store: Arc<EntityStoreService<InMemoryBackend>>,
        ingestor: Arc<LayerIngestor>,
        clock: Arc<FakeClock>,
        scanner: Arc<GapScanner>,
    }

    fn harness(highest: LayerNumber) -> Harness {
        let node = Arc::new(MockNode::with_synthetic_layers(
            NetworkInfo::for_testing(),
            highest,
        ));
        let store = Arc::new(EntityStoreService::in_memory(StoreConfig::for_testing()));
        let ingestor = Arc::new(LayerIngestor::new(node.clone(), store.clone(), true));
        let clock = Arc::new(FakeClock::new());
        let stats = Arc::new(StatsRecalculator::new(
            store.clone(),
            NetworkInfo::for_testing(),
        ));
        let scanner = Arc::new(GapScanner::new(
            ingestor.clone(),
            stats,
            clock.clone(),
            SyncConfig::for_testing(),
        ));
        Harness {
            node,
            store,
            ingestor,
            clock,
            scanner,
        }
    }

    /// Store `layers` and set the watermark to `watermark`.
    async fn seed(h: &Harness, layers: &[LayerNumber], watermark: LayerNumber) {
        for layer in layers {
            h.ingestor.apply(*layer).await.unwrap();
        }
        h.store.advance_watermark(watermark).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_gaps_cross_checks_stored_layers() {
        let h = harness(12);
        seed(&h, &[0, 1, 2, 5, 6, 9, 10], 10).await;
        h.store.add_gaps(&[LayerRange::new(20, 22)]).await.unwrap();

        let gaps = h.scanner.find_gaps().await.unwrap();
        assert_eq!(
            gaps,
            vec![
                LayerRange::new(3, 4),
                LayerRange::new(7, 8),
                LayerRange::new(20, 22)
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_synced_means_only_recorded_gaps() {
        let h = harness(5);
        assert!(h.scanner.find_gaps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backfill_closes_detected_gaps() {
        let h = harness(12);
        seed(&h, &[0, 1, 6, 7, 12], 12).await;

        let report = h.scanner.pass().await.unwrap();
        assert_eq!(
            report.closed,
            vec![LayerRange::new(2, 5), LayerRange::new(8, 11)]
        );
        assert!(report.failed.is_empty());

        let state = h.store.sync_state().await.unwrap();
        assert!(state.gaps.is_empty());
        assert_eq!(state.watermark, Some(12));
        assert!(h.scanner.find_gaps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backfill_refreshes_completed_epochs() {
        let h = harness(12);
        seed(&h, &[0, 1, 6, 7, 12], 12).await;
        StatsRecalculator::new(h.store.clone(), NetworkInfo::for_testing())
            .recalculate(0)
            .await
            .unwrap();
        let stale = h.store.get_epoch(0).await.unwrap().unwrap();
        assert_eq!(stale.stats.layers, 4);

        h.scanner.pass().await.unwrap();

        let epoch = h.store.get_epoch(0).await.unwrap().unwrap();
        assert_eq!(epoch.stats.layers, 10);
        assert_eq!(epoch.stats.transactions, 20);
        // epoch 1 is still open below layer 19
        assert!(h.store.get_epoch(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_with_backoff() {
        let h = harness(6);
        seed(&h, &[0, 6], 6).await;
        h.node.fail_layer(3, 2);

        let report = h.scanner.pass().await.unwrap();
        assert_eq!(report.closed, vec![LayerRange::new(1, 5)]);
        assert_eq!(h.clock.sleeps().len(), 2);
        assert!(h.store.sync_state().await.unwrap().gaps.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_range_stays_pending() {
        let h = harness(6);
        seed(&h, &[0, 6], 6).await;
        h.node.fail_layer(3, 100);

        let report = h.scanner.pass().await.unwrap();
        assert_eq!(report.failed, vec![LayerRange::new(1, 5)]);

        // layers 1 and 2 landed before the failure
        let state = h.store.sync_state().await.unwrap();
        assert_eq!(state.gaps, vec![LayerRange::new(3, 5)]);
        assert_eq!(state.watermark, Some(6));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let h = harness(3);
        seed(&h, &[0, 3], 3).await;
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(h.scanner.clone().run(rx));
        while h.store.get_layer(2).await.unwrap().is_none() {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
