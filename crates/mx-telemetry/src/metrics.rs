//! Prometheus metrics for the explorer collector.
//!
//! All metrics follow the naming convention: `mx_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., sync_layers_applied_total)
//! - **Gauge**: Value that can go up or down (e.g., backfill_gaps_pending)
//! - **Histogram**: Distribution of values (e.g., sync_layer_ingest_duration_seconds)

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SYNC METRICS (Subsystem 2)
    // =========================================================================

    /// Layers applied by live sync
    pub static ref SYNC_LAYERS_APPLIED: IntCounter = IntCounter::new(
        "mx_sync_layers_applied_total",
        "Total number of layers applied by live sync"
    ).expect("metric creation failed");

    /// Current watermark
    pub static ref SYNC_WATERMARK: IntGauge = IntGauge::new(
        "mx_sync_watermark_layer",
        "Highest layer fully ingested by live sync"
    ).expect("metric creation failed");

    /// Per-layer ingestion time
    pub static ref SYNC_LAYER_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "mx_sync_layer_ingest_duration_seconds",
            "Time spent ingesting one layer"
        ).buckets(exponential_buckets(0.001, 2.0, 15).unwrap_or_default())
    ).expect("metric creation failed");

    /// Live sync restarts by the supervisor
    pub static ref SYNC_RESTARTS: IntCounter = IntCounter::new(
        "mx_sync_restarts_total",
        "Number of times the supervisor restarted live sync"
    ).expect("metric creation failed");

    /// Node call failures
    pub static ref NODE_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("mx_node_errors_total", "Node call failures by kind"),
        &["kind"]  // kind: unavailable/timeout/layer_not_available/malformed
    ).expect("metric creation failed");

    // =========================================================================
    // BACKFILL METRICS (Subsystem 2)
    // =========================================================================

    /// Backfilled ranges by outcome
    pub static ref BACKFILL_RANGES: IntCounterVec = IntCounterVec::new(
        Opts::new("mx_backfill_ranges_total", "Backfill ranges processed"),
        &["outcome"]  // outcome: closed/failed
    ).expect("metric creation failed");

    /// Gaps waiting for backfill
    pub static ref BACKFILL_GAPS_PENDING: IntGauge = IntGauge::new(
        "mx_backfill_gaps_pending",
        "Gap ranges recorded in the sync state"
    ).expect("metric creation failed");

    // =========================================================================
    // STATS METRICS (Subsystem 2)
    // =========================================================================

    /// Epoch recalculations by outcome
    pub static ref STATS_RECALCULATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mx_stats_epoch_recalculations_total", "Epoch aggregate recalculations"),
        &["outcome"]  // outcome: ok/failed
    ).expect("metric creation failed");

    // =========================================================================
    // SEARCH METRICS (Subsystem 3)
    // =========================================================================

    /// Search requests by resolved category
    pub static ref SEARCH_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("mx_search_requests_total", "Search requests by resolved category"),
        &["category"]  // category: account/block/.../not_found/error
    ).expect("metric creation failed");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let mut result = Ok(());
    REGISTER.call_once(|| {
        let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
            // Sync
            Box::new(SYNC_LAYERS_APPLIED.clone()),
            Box::new(SYNC_WATERMARK.clone()),
            Box::new(SYNC_LAYER_DURATION.clone()),
            Box::new(SYNC_RESTARTS.clone()),
            Box::new(NODE_ERRORS.clone()),
            // Backfill
            Box::new(BACKFILL_RANGES.clone()),
            Box::new(BACKFILL_GAPS_PENDING.clone()),
            // Stats
            Box::new(STATS_RECALCULATIONS.clone()),
            // Search
            Box::new(SEARCH_REQUESTS.clone()),
        ];

        for metric in metrics {
            if let Err(e) = REGISTRY.register(metric) {
                result = Err(TelemetryError::MetricsInit(e.to_string()));
                return;
            }
        }
    });
    result
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Content type of [`encode_metrics`] output.
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
