//! # Ports Layer
//!
//! Inbound: `EntityStore` (what callers use).
//! Outbound: `DocumentBackend` (what the store needs).

pub mod inbound;
pub mod outbound;

pub use inbound::EntityStore;
pub use outbound::{BatchOperation, DocumentBackend, ScanResult};
