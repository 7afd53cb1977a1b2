//! # Ports Layer
//!
//! Outbound ports only: layer sync is driven by the runtime, not called
//! through an inbound API.

pub mod outbound;

pub use outbound::{synthetic_layer, Clock, FakeClock, MockNode, NodeClient};
