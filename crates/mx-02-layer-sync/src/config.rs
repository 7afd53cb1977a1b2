//! # Layer Sync Configuration
//!
//! Built once at startup and handed to each component constructor.

use std::time::Duration;

use shared_types::LayerNumber;

use crate::domain::Backoff;

/// Layer sync configuration.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Operator-forced starting layer. The stored watermark is never lowered.
    pub start_layer: Option<LayerNumber>,

    /// Run the gap scanner and backfill workers.
    pub sync_missing_layers: bool,

    /// Ingest activations and maintain smesher records.
    pub atx_sync: bool,

    /// Recalculate every epoch's statistics before live sync starts.
    pub recalculate_epoch_stats: bool,

    /// Upper bound on layers applied by one `advance()` call.
    pub max_layers_per_advance: u32,

    /// Sleep between `advance()` calls once caught up with the node.
    pub poll_interval: Duration,

    /// Delay before the supervisor restarts a failed live sync loop.
    pub restart_backoff: Backoff,

    /// Concurrent backfill ranges.
    pub backfill_workers: usize,

    /// Attempts per backfill range before it is left for the next pass.
    pub max_backfill_attempts: u32,

    /// Delay between attempts on the same backfill range.
    pub backfill_backoff: Backoff,

    /// Interval between gap scans.
    pub gap_scan_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_layer: None,
            sync_missing_layers: true,
            atx_sync: true,
            recalculate_epoch_stats: false,
            max_layers_per_advance: 100,
            poll_interval: Duration::from_secs(5),
            restart_backoff: Backoff::Fixed(Duration::from_secs(5)),
            backfill_workers: 4,
            max_backfill_attempts: 5,
            backfill_backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(60),
            },
            gap_scan_interval: Duration::from_secs(300),
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (small batches, short delays).
    pub fn for_testing() -> Self {
        Self {
            max_layers_per_advance: 10,
            poll_interval: Duration::from_millis(10),
            restart_backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
                max: Duration::from_secs(8),
            },
            backfill_workers: 2,
            max_backfill_attempts: 3,
            backfill_backoff: Backoff::Fixed(Duration::from_millis(10)),
            gap_scan_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }
}
