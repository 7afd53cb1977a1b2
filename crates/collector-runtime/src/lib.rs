//! # Explorer Collector Runtime
//!
//! Assembles the entity store, layer sync and search into one process.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Parse configuration (flags with environment fallbacks)
//! 3. Open the entity store (fatal on failure)
//! 4. Fetch network parameters from the node (fatal on failure)
//! 5. Forced epoch statistics pass, when configured
//! 6. Write the process marker (failure is logged)
//! 7. Spawn live sync, gap scanner, search API and metrics exporter
//! 8. Wait for SIGINT/SIGTERM, then broadcast shutdown
//!
//! ## Module Structure
//!
//! - `config` - clap flags and the resolved `CollectorConfig`
//! - `marker` - process marker file with an advisory lock
//! - `metrics_server` - Prometheus exporter
//! - `runtime` - component wiring and task lifecycle

pub mod config;
pub mod marker;
pub mod metrics_server;
pub mod runtime;

pub use config::{Args, CollectorConfig, ConfigError};
pub use marker::{MarkerError, ProcessMarker};
pub use runtime::{join_all, shutdown_signal, Collector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
