//! # Adapters Layer
//!
//! - `json_rpc`: node client over HTTP JSON-RPC
//! - `clock`: tokio-timer clock

pub mod clock;
pub mod json_rpc;

pub use clock::TokioClock;
pub use json_rpc::{JsonRpcNodeClient, NodeStatus};
