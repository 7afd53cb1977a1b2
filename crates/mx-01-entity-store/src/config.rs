//! # Entity Store Configuration

use std::time::Duration;

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Entity store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Bound on every store call. Elapsed calls fail with `StoreError::Timeout`.
    pub call_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Create a config for testing (short timeout).
    pub fn for_testing() -> Self {
        Self {
            call_timeout: Duration::from_millis(500),
        }
    }
}
