//! # Application Layer
//!
//! - `ingest`: the shared fetch-and-store path
//! - `engine`: live sync cursor
//! - `gaps`: gap detection and concurrent backfill
//! - `stats`: epoch aggregates
//! - `supervisor`: restart loop around live sync

pub mod engine;
pub mod gaps;
pub mod ingest;
pub mod stats;
pub mod supervisor;

pub use engine::SyncEngine;
pub use gaps::{BackfillReport, GapScanner};
pub use ingest::LayerIngestor;
pub use stats::StatsRecalculator;
pub use supervisor::{LiveSync, Supervisor};
