//! # Domain Layer
//!
//! Node snapshots, epoch aggregation, retry policy and errors.

pub mod backoff;
pub mod errors;
pub mod snapshot;
pub mod stats;

pub use backoff::Backoff;
pub use errors::{NodeError, SyncError};
pub use snapshot::LayerSnapshot;
pub use stats::compute_epoch_stats;
