//! # Sync → Search
//!
//! Layers served by the node are ingested by the engine and then resolvable
//! through the identifier resolver, with epoch aggregates written at each
//! boundary.

#[cfg(test)]
mod tests {
    use mx_01_entity_store::EntityStore;
    use mx_02_layer_sync::{synthetic_layer, SyncConfig};
    use shared_types::EpochStats;

    use crate::Pipeline;

    #[tokio::test]
    async fn test_synced_entities_resolve_to_their_pages() {
        let p = Pipeline::in_memory(24, SyncConfig::for_testing());
        assert_eq!(p.sync_to_tip().await, 25);
        assert_eq!(p.watermark().await, Some(24));

        let layer = synthetic_layer(&p.network, 7);
        let account = &layer.accounts[0].address;
        let block = &layer.blocks[1].id;
        let tx = &layer.transactions[0].id;
        let atx = &layer.activations[0].id;
        let smesher = &layer.activations[0].smesher_id;

        assert_eq!(p.redirect(account).await, Some(format!("/address/{account}")));
        assert_eq!(p.redirect(block).await, Some(format!("/blocks/{block}")));
        assert_eq!(p.redirect(tx).await, Some(format!("/txs/{tx}")));
        assert_eq!(p.redirect(atx).await, Some(format!("/atxs/{atx}")));
        assert_eq!(p.redirect(smesher).await, Some(format!("/smeshers/{smesher}")));

        assert_eq!(p.redirect("24").await, Some("/layers/24".to_string()));
        assert_eq!(p.redirect("2").await, Some("/epochs/2".to_string()));
        assert_eq!(p.redirect("25").await, None);
    }

    #[tokio::test]
    async fn test_reward_resolves_by_store_assigned_id() {
        let p = Pipeline::in_memory(5, SyncConfig::for_testing());
        p.sync_to_tip().await;

        // re-upserting an ingested reward hands back its existing id
        let record = &synthetic_layer(&p.network, 4).rewards[0];
        let id = p.store.upsert_reward(record).await.unwrap();
        let reward = p.store.get_reward(&id).await.unwrap().unwrap();
        assert_eq!(reward.layer, 4);

        let hex = id.to_hex();
        assert_eq!(p.redirect(&hex).await, Some(format!("/rewards/{hex}")));
    }

    #[tokio::test]
    async fn test_completed_epochs_have_aggregates() {
        let p = Pipeline::in_memory(24, SyncConfig::for_testing());
        p.sync_to_tip().await;

        let epoch = p.store.get_epoch(0).await.unwrap().unwrap();
        assert_eq!(epoch.first_layer, 0);
        assert_eq!(epoch.last_layer, 9);
        assert_eq!(
            epoch.stats,
            EpochStats {
                accounts: epoch.stats.accounts,
                layers: 10,
                transactions: 20,
                activations: 10,
                smeshers: 3,
                rewards_total: (0..10).map(|n| 1_000 + n).sum(),
                commitment_total: 10 << 30,
            }
        );
        assert!(p.store.get_epoch(1).await.unwrap().is_some());
        // epoch 2 is still open
        assert!(p.store.get_epoch(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_smesher_counts_every_activation() {
        let p = Pipeline::in_memory(8, SyncConfig::for_testing());
        p.sync_to_tip().await;

        let smeshers = p.store.list_smeshers().await.unwrap();
        let mut counts: Vec<u32> = smeshers.iter().map(|s| s.atx_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![3, 3, 3]);

        for smesher in &smeshers {
            let entry = p.store.get_coinbase(&smesher.coinbase).await.unwrap().unwrap();
            assert_eq!(entry.smesher_id, smesher.id);
        }
    }

    #[tokio::test]
    async fn test_activation_sync_disabled() {
        let config = SyncConfig {
            atx_sync: false,
            ..SyncConfig::for_testing()
        };
        let p = Pipeline::in_memory(3, config);
        p.sync_to_tip().await;

        let layer = synthetic_layer(&p.network, 2);
        assert_eq!(p.redirect(&layer.activations[0].id).await, None);
        assert_eq!(p.redirect(&layer.activations[0].smesher_id).await, None);
        let tx = &layer.transactions[1].id;
        assert_eq!(p.redirect(tx).await, Some(format!("/txs/{tx}")));
    }

    #[tokio::test]
    async fn test_searches_during_sync_see_only_stored_layers() {
        let p = Pipeline::in_memory(30, SyncConfig::for_testing());

        let (synced, lookups) = futures::join!(p.sync_to_tip(), async {
            let mut seen = Vec::new();
            for _ in 0..20 {
                seen.push(p.redirect("30").await);
                tokio::task::yield_now().await;
            }
            seen
        });

        assert_eq!(synced, 31);
        assert!(lookups
            .iter()
            .all(|r| r.is_none() || r.as_deref() == Some("/layers/30")));
        assert_eq!(p.redirect("30").await, Some("/layers/30".to_string()));
    }
}
