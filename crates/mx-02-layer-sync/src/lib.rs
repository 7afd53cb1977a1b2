//! # MX-02 Layer Sync
//!
//! Walks the node's ledger layer by layer into the entity store, backfills
//! missing layers and keeps epoch statistics current.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | `SyncEngine` | Applies layers in increasing order, moves the watermark |
//! | `GapScanner` | Finds missing layers below the watermark, backfills them |
//! | `StatsRecalculator` | Rebuilds epoch aggregates from stored layers |
//! | `Supervisor` | Restarts live sync after failures with a backoff |
//!
//! ## Guarantees
//!
//! - The watermark only moves forward, and only past fully stored layers.
//! - Re-ingesting a layer leaves the store unchanged.
//! - Backfill never touches the watermark; failed ranges stay recorded.
//!
//! ## Module Structure
//!
//! ```text
//! mx-02-layer-sync/
//! ├── domain/       # LayerSnapshot, epoch stats, Backoff, errors
//! ├── ports/        # NodeClient, Clock (+ MockNode, FakeClock)
//! ├── adapters/     # JsonRpcNodeClient, TokioClock
//! ├── application/  # Ingestor, engine, gap scanner, stats, supervisor
//! └── config.rs     # SyncConfig
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{JsonRpcNodeClient, TokioClock};
pub use application::{
    BackfillReport, GapScanner, LayerIngestor, LiveSync, StatsRecalculator, Supervisor, SyncEngine,
};
pub use config::SyncConfig;
pub use domain::{compute_epoch_stats, Backoff, LayerSnapshot, NodeError, SyncError};
pub use ports::{synthetic_layer, Clock, FakeClock, MockNode, NodeClient};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
