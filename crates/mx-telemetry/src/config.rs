//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to JSON log lines
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error, or EnvFilter syntax)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Include the event target in human readable logs
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "explorer-collector".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MX_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `MX_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            log_level: env::var("MX_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("MX_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(is_container),

            ..Self::default()
        }
    }

    /// Quiet configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            log_level: "warn".to_string(),
            with_target: false,
            ..Self::default()
        }
    }
}
