//! # Domain Errors
//!
//! Node and sync failures, each mapped onto the shared [`ErrorClass`].

use mx_01_entity_store::StoreError;
use shared_types::network::NetworkInfoError;
use shared_types::{Classify, ErrorClass, LayerNumber, LayerRange};
use thiserror::Error;

/// Failures talking to the node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Connection refused, reset, or an RPC-level error.
    #[error("node unavailable at {endpoint}: {message}")]
    Unavailable {
        /// Endpoint that failed
        endpoint: String,
        /// Underlying failure
        message: String,
    },

    /// Call exceeded the per-call timeout.
    #[error("node call {method} timed out after {timeout_ms}ms")]
    Timeout {
        /// RPC method
        method: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// The node has not produced (or no longer serves) this layer.
    #[error("layer {layer} not available from node")]
    LayerNotAvailable {
        /// Requested layer
        layer: LayerNumber,
    },

    /// Response could not be decoded or failed validation.
    #[error("malformed node response for {method}: {message}")]
    Malformed {
        /// RPC method
        method: String,
        /// What was wrong
        message: String,
    },
}

impl NodeError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::Unavailable { .. } => "unavailable",
            NodeError::Timeout { .. } => "timeout",
            NodeError::LayerNotAvailable { .. } => "layer_not_available",
            NodeError::Malformed { .. } => "malformed",
        }
    }
}

impl Classify for NodeError {
    fn class(&self) -> ErrorClass {
        match self {
            NodeError::Malformed { .. } => ErrorClass::Fatal,
            _ => ErrorClass::Transient,
        }
    }
}

/// Sync, backfill and statistics failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Node call failed.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The node reported unusable network constants.
    #[error("invalid network info: {0}")]
    Network(#[from] NetworkInfoError),

    /// A backfill range kept failing; it stays in the gap list.
    #[error("backfill of {range} failed after {attempts} attempts: {source}")]
    BackfillExhausted {
        /// Range that failed
        range: LayerRange,
        /// Attempts made
        attempts: u32,
        /// Last failure
        #[source]
        source: Box<SyncError>,
    },
}

impl Classify for SyncError {
    fn class(&self) -> ErrorClass {
        match self {
            SyncError::Node(e) => e.class(),
            SyncError::Store(e) => e.class(),
            SyncError::Network(_) => ErrorClass::Fatal,
            SyncError::BackfillExhausted { .. } => ErrorClass::Transient,
        }
    }
}
