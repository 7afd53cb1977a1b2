//! Structured logging.
//!
//! One global `tracing` subscriber: an `EnvFilter` plus either a human
//! readable `fmt` layer or a JSON layer for log shippers.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the filter, falling back to `info` on an unparsable directive.
pub fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let result = if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "[runtime] logging initialised"
    );
    Ok(())
}
