//! # Explorer Telemetry
//!
//! Logging and metrics shared by every explorer subsystem.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with env filter, human or JSON output
//! - **Metrics**: Prometheus registry scraped from the collector's `/metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mx_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{encode_metrics, metrics_content_type, register_metrics, HistogramTimer};

use thiserror::Error;

/// Errors from telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Failed to register or encode metrics
    #[error("Metrics error: {0}")]
    MetricsInit(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.service_name.is_empty() {
        return Err(TelemetryError::Config("service name is empty".to_string()));
    }
    register_metrics()?;
    init_logging(config)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
