//! # Search Configuration

use std::time::Duration;

/// Search HTTP configuration.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Upper bound on one request, including every store probe.
    pub request_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl SearchConfig {
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(2),
        }
    }
}
