//! # RocksDB Backend
//!
//! Production `DocumentBackend`.
//!
//! ## Features
//!
//! - One column family per collection
//! - Atomic batch writes (`WriteBatch`) across column families
//! - Snappy compression
//! - Bloom filters for point lookups (existence probes from search)

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};

use crate::domain::{Collection, StoreError};
use crate::ports::outbound::{BatchOperation, DocumentBackend, ScanResult};

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/explorer".to_string(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Config rooted at `<store_path>/<db>`.
    pub fn at(store_path: impl AsRef<Path>, db: &str) -> Self {
        Self {
            path: store_path.as_ref().join(db).to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed document backend.
pub struct RocksDbBackend {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

impl RocksDbBackend {
    /// Open or create the database with every collection's column family.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = Collection::ALL
            .iter()
            .map(|collection| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(collection.name(), cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            StoreError::Open {
                path: config.path.clone(),
                message: e.to_string(),
            }
        })?;

        tracing::info!(path = %config.path, "[mx-01] RocksDB opened");

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

fn cf<'a>(db: &'a DB, collection: Collection) -> Result<&'a ColumnFamily, StoreError> {
    db.cf_handle(collection.name())
        .ok_or_else(|| StoreError::backend(collection.name(), "missing column family"))
}

impl DocumentBackend for RocksDbBackend {
    fn get(&self, collection: Collection, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let db = self.db.read();
        db.get_cf(cf(&db, collection)?, key)
            .map_err(|e| StoreError::backend(collection.name(), e))
    }

    fn exists(&self, collection: Collection, key: &[u8]) -> Result<bool, StoreError> {
        let db = self.db.read();
        db.get_pinned_cf(cf(&db, collection)?, key)
            .map(|v| v.is_some())
            .map_err(|e| StoreError::backend(collection.name(), e))
    }

    fn scan(
        &self,
        collection: Collection,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<ScanResult, StoreError> {
        let db = self.db.read();
        let iter = db.iterator_cf(
            cf(&db, collection)?,
            IteratorMode::From(start, Direction::Forward),
        );

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::backend(collection.name(), e))?;
            if end.is_some_and(|end| key.as_ref() >= end) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let db = self.db.write();
        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                BatchOperation::Put {
                    collection,
                    key,
                    value,
                } => batch.put_cf(cf(&db, collection)?, key, value),
                BatchOperation::Delete { collection, key } => {
                    batch.delete_cf(cf(&db, collection)?, key)
                }
            }
        }

        db.write_opt(batch, &self.write_options())
            .map_err(|e| StoreError::backend("batch", e))
    }
}
