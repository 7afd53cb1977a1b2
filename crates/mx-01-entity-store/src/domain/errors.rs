//! # Domain Errors
//!
//! Error types for the Entity Store.

use shared_types::{Classify, ErrorClass};
use thiserror::Error;

/// Entity store error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be opened at startup.
    #[error("failed to open store at {path}: {message}")]
    Open {
        /// Database location
        path: String,
        /// Backend message
        message: String,
    },

    /// A backend read or write failed.
    #[error("backend error in {collection}: {message}")]
    Backend {
        /// Collection being accessed
        collection: &'static str,
        /// Backend message
        message: String,
    },

    /// A document could not be mapped to or from its stored form.
    #[error("document mapping failed in {collection}: {message}")]
    Mapping {
        /// Collection being accessed
        collection: &'static str,
        /// Serializer message
        message: String,
    },

    /// The call did not finish within the per-call timeout.
    #[error("store operation {operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation name
        operation: &'static str,
        /// Configured timeout
        timeout_ms: u64,
    },

    /// The blocking task running the call was cancelled or panicked.
    #[error("store operation {operation} aborted: {message}")]
    TaskFailed {
        /// Operation name
        operation: &'static str,
        /// Join error
        message: String,
    },
}

impl Classify for StoreError {
    fn class(&self) -> ErrorClass {
        match self {
            StoreError::Open { .. } | StoreError::Mapping { .. } => ErrorClass::Fatal,
            StoreError::Backend { .. }
            | StoreError::Timeout { .. }
            | StoreError::TaskFailed { .. } => ErrorClass::Transient,
        }
    }
}

impl StoreError {
    pub fn backend(collection: &'static str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            collection,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let timeout = StoreError::Timeout {
            operation: "get",
            timeout_ms: 5000,
        };
        assert_eq!(timeout.class(), ErrorClass::Transient);

        let open = StoreError::Open {
            path: "/tmp/x".into(),
            message: "locked".into(),
        };
        assert_eq!(open.class(), ErrorClass::Fatal);
    }
}
