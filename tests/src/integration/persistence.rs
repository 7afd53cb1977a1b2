//! # Restart Resumption
//!
//! The sync state lives in the store: a collector reopened on the same
//! RocksDB directory resumes from the stored watermark with its gap list
//! intact.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use mx_01_entity_store::{
        EntityStore, EntityStoreService, RocksDbBackend, RocksDbConfig, StoreConfig,
    };
    use mx_02_layer_sync::{synthetic_layer, MockNode, SyncConfig};
    use shared_types::{LayerRange, NetworkInfo};
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    use crate::Pipeline;

    fn open(path: &Path, highest: u32, config: SyncConfig) -> Pipeline<RocksDbBackend> {
        let backend = RocksDbBackend::open(RocksDbConfig::for_testing(path.to_string_lossy()))
            .expect("open rocksdb");
        let store = Arc::new(EntityStoreService::new(
            Arc::new(backend),
            StoreConfig::for_testing(),
        ));
        let node = Arc::new(MockNode::with_synthetic_layers(
            NetworkInfo::for_testing(),
            highest,
        ));
        Pipeline::new(store, node, config)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reopened_store_resumes_from_watermark() {
        let dir = TempDir::new().unwrap();

        {
            let first = open(dir.path(), 12, SyncConfig::for_testing());
            assert_eq!(first.sync_to_tip().await, 13);
        }

        let second = open(dir.path(), 20, SyncConfig::for_testing());
        assert_eq!(second.watermark().await, Some(12));
        assert_eq!(second.sync_to_tip().await, 8);
        assert_eq!(second.engine.cursor(), Some(21));

        let tx = &synthetic_layer(&second.network, 10).transactions[0].id;
        assert_eq!(second.redirect(tx).await, Some(format!("/txs/{tx}")));
        // only layers above the stored watermark were requested again
        assert_eq!(second.node.layer_calls(), 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_gap_list_survives_restart() {
        let dir = TempDir::new().unwrap();

        {
            let config = SyncConfig {
                start_layer: Some(5),
                ..SyncConfig::for_testing()
            };
            let first = open(dir.path(), 7, config);
            first.sync_to_tip().await;
        }

        let second = open(dir.path(), 7, SyncConfig::for_testing());
        let state = assert_ok!(second.store.sync_state().await);
        assert_eq!(state.gaps, vec![LayerRange::new(0, 4)]);

        let report = assert_ok!(second.scanner.pass().await);
        assert_eq!(report.closed, vec![LayerRange::new(0, 4)]);
        assert!(assert_ok!(second.store.sync_state().await).gaps.is_empty());
    }
}
