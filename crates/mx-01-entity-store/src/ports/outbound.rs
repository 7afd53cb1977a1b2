//! # Outbound Ports (Driven Ports)
//!
//! The key-value backend the entity store is written against.
//!
//! Production: `RocksDbBackend` (adapters/rocksdb_backend.rs, feature `rocksdb`)
//! Testing: `InMemoryBackend` (adapters/memory.rs)

use crate::domain::collections::{prefix_successor, Collection};
use crate::domain::errors::StoreError;

/// Key-value pairs returned by a scan, in key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Namespaced key-value backend.
///
/// Calls are blocking; the service runs them on the blocking pool.
pub trait DocumentBackend: Send + Sync + 'static {
    /// Get a value by key.
    fn get(&self, collection: Collection, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check if a key exists.
    fn exists(&self, collection: Collection, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(collection, key)?.is_some())
    }

    /// Keys in `[start, end)` in ascending order. `end = None` scans to the
    /// end of the collection.
    fn scan(
        &self,
        collection: Collection,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<ScanResult, StoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either every operation is applied or none is.
    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError>;

    /// Put a single key-value pair.
    fn put(&self, collection: Collection, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.write_batch(vec![BatchOperation::put(collection, key, value)])
    }

    /// Every key starting with `prefix`.
    fn scan_prefix(&self, collection: Collection, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        let end = prefix_successor(prefix);
        self.scan(collection, prefix, end.as_deref())
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        collection: Collection,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete { collection: Collection, key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(collection: Collection, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            collection,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(collection: Collection, key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete {
            collection,
            key: key.into(),
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            BatchOperation::Put { collection, .. } | BatchOperation::Delete { collection, .. } => {
                *collection
            }
        }
    }
}
