//! # Gap Backfill
//!
//! Gaps left by a start-layer skip or by a previous run are found and closed
//! through the same ingestion path as live sync, including while live sync
//! is still advancing.

#[cfg(test)]
mod tests {
    use mx_01_entity_store::EntityStore;
    use mx_02_layer_sync::SyncConfig;
    use shared_types::LayerRange;
    use tokio_test::assert_ok;

    use crate::Pipeline;

    #[tokio::test]
    async fn test_skipped_range_is_backfilled() {
        let config = SyncConfig {
            start_layer: Some(15),
            ..SyncConfig::for_testing()
        };
        let p = Pipeline::in_memory(24, config);

        assert_eq!(p.sync_to_tip().await, 10);
        let state = assert_ok!(p.store.sync_state().await);
        assert_eq!(state.gaps, vec![LayerRange::new(0, 14)]);

        let report = assert_ok!(p.scanner.pass().await);
        assert_eq!(report.closed, vec![LayerRange::new(0, 14)]);

        assert!(assert_ok!(p.scanner.find_gaps().await).is_empty());
        let stored = assert_ok!(p.store.stored_layers(LayerRange::new(0, 24)).await);
        assert_eq!(stored, (0..=24).collect::<Vec<_>>());
        assert_eq!(p.watermark().await, Some(24));
    }

    #[tokio::test]
    async fn test_backfilled_and_live_layers_match_a_clean_sync() {
        let config = SyncConfig {
            start_layer: Some(12),
            ..SyncConfig::for_testing()
        };
        let split = Pipeline::in_memory(24, config);
        split.sync_to_tip().await;
        assert_ok!(split.scanner.pass().await);

        let clean = Pipeline::in_memory(24, SyncConfig::for_testing());
        clean.sync_to_tip().await;

        let mut split_smeshers = assert_ok!(split.store.list_smeshers().await);
        let mut clean_smeshers = assert_ok!(clean.store.list_smeshers().await);
        split_smeshers.sort_by(|a, b| a.id.cmp(&b.id));
        clean_smeshers.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(split_smeshers, clean_smeshers);

        // epoch 1 was aggregated at layer 20 with only 12..=19 stored; closing
        // the gap rebuilt it along with epoch 0
        for epoch in 0..=1 {
            let split_epoch = assert_ok!(split.store.get_epoch(epoch).await);
            let clean_epoch = assert_ok!(clean.store.get_epoch(epoch).await);
            assert_eq!(split_epoch, clean_epoch);
        }
    }

    #[tokio::test]
    async fn test_backfill_races_live_sync() {
        let p = Pipeline::in_memory(40, SyncConfig::for_testing());
        // a previous run stored 0..=20 except 5..=8
        for layer in (0..=20).filter(|l| !(5..=8).contains(l)) {
            assert_ok!(p.ingestor.apply(layer).await);
        }
        assert_ok!(p.store.advance_watermark(20).await);

        let (applied, report) = futures::join!(p.sync_to_tip(), p.scanner.pass());

        assert_eq!(applied, 20);
        let report = assert_ok!(report);
        assert_eq!(report.closed, vec![LayerRange::new(5, 8)]);

        let state = assert_ok!(p.store.sync_state().await);
        assert_eq!(state.watermark, Some(40));
        assert!(state.gaps.is_empty());
        let stored = assert_ok!(p.store.stored_layers(LayerRange::new(0, 40)).await);
        assert_eq!(stored.len(), 41);
    }

    #[tokio::test]
    async fn test_failed_range_survives_until_node_recovers() {
        let config = SyncConfig {
            start_layer: Some(6),
            ..SyncConfig::for_testing()
        };
        let p = Pipeline::in_memory(8, config);
        p.sync_to_tip().await;
        p.node.fail_layer(2, 100);

        let report = assert_ok!(p.scanner.pass().await);
        assert_eq!(report.failed, vec![LayerRange::new(0, 5)]);
        let state = assert_ok!(p.store.sync_state().await);
        assert_eq!(state.gaps, vec![LayerRange::new(2, 5)]);
        assert_eq!(p.clock.sleeps().len(), 2);

        p.node.fail_layer(2, 0);
        let report = assert_ok!(p.scanner.pass().await);
        assert_eq!(report.closed, vec![LayerRange::new(2, 5)]);
        assert!(assert_ok!(p.store.sync_state().await).gaps.is_empty());
    }
}
