//! # Adapters
//!
//! `DocumentBackend` implementations.

mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb_backend;

pub use memory::InMemoryBackend;
#[cfg(feature = "rocksdb")]
pub use rocksdb_backend::{RocksDbBackend, RocksDbConfig};
