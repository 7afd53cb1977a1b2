//! # MX-01 Entity Store
//!
//! Idempotent persistence for the explorer's typed collections.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Consistency Contract
//!
//! | Record | Write rule |
//! |--------|------------|
//! | Layer, Block, Transaction, Activation | Keyed by natural id; rewriting is a no-op |
//! | Account | Snapshot with the higher `layer_updated` wins |
//! | Reward | Natural key (layer, smesher) keeps the store-assigned id |
//! | Smesher + coinbase index | One atomic batch; `atx_count` recounted |
//! | Epoch | Overwritten in one put |
//! | SyncState | Watermark never decreases; gaps merged |
//!
//! ## Module Structure
//!
//! ```text
//! mx-01-entity-store/
//! ├── domain/     # Collections, keys, document mapping, errors
//! ├── ports/      # EntityStore (inbound) + DocumentBackend (outbound)
//! ├── adapters/   # InMemoryBackend, RocksDbBackend (feature "rocksdb")
//! ├── service/    # EntityStoreService
//! └── config.rs   # StoreConfig
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryBackend;
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbBackend, RocksDbConfig};
pub use config::StoreConfig;
pub use domain::{Collection, Document, RangeContents, StoreError};
pub use ports::{BatchOperation, DocumentBackend, EntityStore};
pub use service::EntityStoreService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
