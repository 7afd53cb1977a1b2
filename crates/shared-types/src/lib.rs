//! # Shared Types Crate
//!
//! Domain records for the explorer collector, shared by every subsystem.
//!
//! ## Design Principles
//!
//! - **Typed records only**: every collection in the entity store has exactly
//!   one record type here. Untyped documents never leave the store's mapping
//!   layer.
//! - **Natural keys**: each record exposes the identifier it is upserted by.
//! - **Derived data is marked as such**: `Epoch` aggregates are a cache that
//!   can always be rebuilt from layers, transactions and activations.

pub mod entities;
pub mod errors;
pub mod layer_range;
pub mod network;
pub mod object_id;

pub use entities::*;
pub use errors::*;
pub use layer_range::{merge_ranges, missing_ranges, subtract_range, LayerRange};
pub use network::NetworkInfo;
pub use object_id::ObjectId;
