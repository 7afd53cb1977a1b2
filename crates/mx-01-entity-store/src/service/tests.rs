use std::collections::HashMap;
use std::time::Duration;

use shared_types::{
    Account, Activation, Classify, ErrorClass, LayerRange, RewardRecord, Transaction, TxStatus,
    HASH_ID_LENGTH,
};

use super::*;

fn store() -> EntityStoreService<InMemoryBackend> {
    EntityStoreService::in_memory(StoreConfig::for_testing())
}

fn hash_id(tag: char) -> String {
    format!("0x{}", tag.to_string().repeat(HASH_ID_LENGTH - 2))
}

fn atx(id: &str, smesher: &str, coinbase: &str, layer: u32, timestamp: u64) -> Activation {
    Activation {
        id: id.to_string(),
        smesher_id: smesher.to_string(),
        coinbase: coinbase.to_string(),
        layer,
        commitment_size: 1024 * u64::from(layer + 1),
        timestamp,
    }
}

fn tx(id: &str, layer: u32) -> Transaction {
    Transaction {
        id: id.to_string(),
        sender: "sm1sender".into(),
        recipient: "sm1recipient".into(),
        amount: 10,
        fee: 1,
        layer,
        status: TxStatus::Applied,
    }
}

/// Every smesher with a coinbase has exactly one entry pointing back, and
/// every entry points at a smesher holding that coinbase.
async fn assert_coinbase_index_consistent(store: &EntityStoreService<InMemoryBackend>) {
    let smeshers = store.list_smeshers().await.unwrap();
    let coinbases = store.list_coinbases().await.unwrap();

    let by_id: HashMap<_, _> = smeshers.iter().map(|s| (s.id.clone(), s)).collect();
    for entry in &coinbases {
        let smesher = by_id
            .get(&entry.smesher_id)
            .unwrap_or_else(|| panic!("entry {} points at missing smesher", entry.address));
        assert_eq!(smesher.coinbase, entry.address);
    }
    for smesher in smeshers.iter().filter(|s| !s.coinbase.is_empty()) {
        let pointing: Vec<_> = coinbases
            .iter()
            .filter(|e| e.address == smesher.coinbase && e.smesher_id == smesher.id)
            .collect();
        assert_eq!(pointing.len(), 1, "smesher {} index entries", smesher.id);
    }
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn test_reapplying_records_is_a_no_op() {
    let store = store();
    let activation = atx(&hash_id('a'), &hash_id('5'), "sm1cb", 3, 100);
    let transaction = tx(&hash_id('b'), 3);
    let reward = RewardRecord {
        smesher_id: hash_id('5'),
        coinbase: "sm1cb".into(),
        layer: 3,
        total: 50,
        layer_reward: 45,
    };

    store.upsert_activation(&activation).await.unwrap();
    store.put_transaction(&transaction).await.unwrap();
    let first_id = store.upsert_reward(&reward).await.unwrap();
    let once = store.backend().snapshot();

    store.upsert_activation(&activation).await.unwrap();
    store.put_transaction(&transaction).await.unwrap();
    let second_id = store.upsert_reward(&reward).await.unwrap();

    assert_eq!(first_id, second_id);
    assert_eq!(store.backend().snapshot(), once);
}

// =============================================================================
// Smesher + coinbase index
// =============================================================================

#[tokio::test]
async fn test_atx_count_is_recounted() {
    let store = store();
    let smesher = hash_id('5');

    store.upsert_activation(&atx("atx-1", &smesher, "sm1cb", 1, 10)).await.unwrap();
    store.upsert_activation(&atx("atx-2", &smesher, "sm1cb", 2, 20)).await.unwrap();
    let stored = store.upsert_activation(&atx("atx-2", &smesher, "sm1cb", 2, 20)).await.unwrap();

    assert_eq!(stored.atx_count, 2);
    assert_eq!(store.get_smesher(&smesher).await.unwrap().unwrap().atx_count, 2);
}

#[tokio::test]
async fn test_coinbase_change_moves_index_entry() {
    let store = store();
    let smesher = hash_id('5');

    store.upsert_activation(&atx("atx-1", &smesher, "sm1old", 1, 10)).await.unwrap();
    store.upsert_activation(&atx("atx-2", &smesher, "sm1new", 2, 20)).await.unwrap();

    assert!(store.get_coinbase("sm1old").await.unwrap().is_none());
    let entry = store.get_coinbase("sm1new").await.unwrap().unwrap();
    assert_eq!(entry.smesher_id, smesher);
    assert_coinbase_index_consistent(&store).await;
}

#[tokio::test]
async fn test_older_activation_does_not_overwrite_attributes() {
    let store = store();
    let smesher = hash_id('5');

    store.upsert_activation(&atx("atx-9", &smesher, "sm1new", 9, 90)).await.unwrap();
    // backfill delivers an older activation afterwards
    let stored = store.upsert_activation(&atx("atx-2", &smesher, "sm1old", 2, 20)).await.unwrap();

    assert_eq!(stored.coinbase, "sm1new");
    assert_eq!(stored.timestamp, 90);
    assert_eq!(stored.atx_count, 2);
    assert!(store.get_coinbase("sm1old").await.unwrap().is_none());
    assert_coinbase_index_consistent(&store).await;
}

#[tokio::test]
async fn test_shared_coinbase_displaces_previous_smesher() {
    let store = store();
    let first = hash_id('1');
    let second = hash_id('2');

    store.upsert_activation(&atx("atx-1", &first, "sm1shared", 1, 10)).await.unwrap();
    store.upsert_activation(&atx("atx-2", &second, "sm1shared", 2, 20)).await.unwrap();

    let entry = store.get_coinbase("sm1shared").await.unwrap().unwrap();
    assert_eq!(entry.smesher_id, second);
    assert_eq!(store.get_smesher(&first).await.unwrap().unwrap().coinbase, "");
    assert_coinbase_index_consistent(&store).await;
}

#[tokio::test]
async fn test_replayed_older_activation_keeps_newer_coinbase_owner() {
    let store = store();
    let first = hash_id('a');
    let second = hash_id('b');
    let older = atx("atx-1", &first, "sm1coinbasex", 1, 10);

    store.upsert_activation(&older).await.unwrap();
    store.upsert_activation(&atx("atx-2", &second, "sm1coinbasex", 2, 20)).await.unwrap();
    let before = store.backend().snapshot();

    let replayed = store.upsert_activation(&older).await.unwrap();
    assert_eq!(replayed.coinbase, "");
    assert_eq!(replayed.atx_count, 1);

    assert_eq!(store.backend().snapshot(), before);
    let entry = store.get_coinbase("sm1coinbasex").await.unwrap().unwrap();
    assert_eq!(entry.smesher_id, second);
    assert_coinbase_index_consistent(&store).await;
}

#[tokio::test]
async fn test_shared_coinbase_owner_is_independent_of_apply_order() {
    let first = hash_id('a');
    let second = hash_id('b');
    let older = atx("atx-1", &first, "sm1shared", 1, 10);
    let newer = atx("atx-2", &second, "sm1shared", 2, 20);

    let in_order = store();
    in_order.upsert_activation(&older).await.unwrap();
    in_order.upsert_activation(&newer).await.unwrap();

    let reversed = store();
    reversed.upsert_activation(&newer).await.unwrap();
    reversed.upsert_activation(&older).await.unwrap();

    assert_eq!(reversed.backend().snapshot(), in_order.backend().snapshot());
    let entry = reversed.get_coinbase("sm1shared").await.unwrap().unwrap();
    assert_eq!(entry.smesher_id, second);
    assert_eq!(reversed.get_smesher(&first).await.unwrap().unwrap().coinbase, "");
    assert_coinbase_index_consistent(&reversed).await;
}

#[tokio::test]
async fn test_failed_pair_write_leaves_both_untouched() {
    let store = store();
    let smesher = hash_id('5');
    store.upsert_activation(&atx("atx-1", &smesher, "sm1old", 1, 10)).await.unwrap();

    store.backend().set_fail_writes(true);
    let err = store
        .upsert_activation(&atx("atx-2", &smesher, "sm1new", 2, 20))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Transient);

    store.backend().set_fail_writes(false);
    assert_eq!(store.get_smesher(&smesher).await.unwrap().unwrap().coinbase, "sm1old");
    assert!(store.get_coinbase("sm1new").await.unwrap().is_none());
    assert_coinbase_index_consistent(&store).await;
}

// =============================================================================
// Accounts and rewards
// =============================================================================

#[tokio::test]
async fn test_account_snapshot_never_regresses() {
    let store = store();
    let address = "a".repeat(42);
    let snapshot = |layer: u32, balance: u64| Account {
        address: address.clone(),
        balance,
        nonce: u64::from(layer),
        created_layer: layer,
        layer_updated: layer,
    };

    store.upsert_account(&snapshot(10, 500)).await.unwrap();
    let merged = store.upsert_account(&snapshot(4, 20)).await.unwrap();

    assert_eq!(merged.balance, 500);
    assert_eq!(merged.created_layer, 4);
    assert_eq!(store.get_account(&address).await.unwrap(), Some(merged));
}

#[tokio::test]
async fn test_distinct_rewards_get_distinct_ids() {
    let store = store();
    let record = |layer: u32| RewardRecord {
        smesher_id: hash_id('5'),
        coinbase: "sm1cb".into(),
        layer,
        total: 7,
        layer_reward: 7,
    };

    let a = store.upsert_reward(&record(1)).await.unwrap();
    let b = store.upsert_reward(&record(2)).await.unwrap();
    assert_ne!(a, b);
    assert!(store.reward_exists(&a).await.unwrap());
    assert_eq!(store.get_reward(&b).await.unwrap().unwrap().layer, 2);
}

// =============================================================================
// Sync cursor
// =============================================================================

#[tokio::test]
async fn test_watermark_is_monotonic() {
    let store = store();
    assert_eq!(store.sync_state().await.unwrap().watermark, None);

    store.advance_watermark(10).await.unwrap();
    let state = store.advance_watermark(3).await.unwrap();
    assert_eq!(state.watermark, Some(10));

    let state = store.advance_watermark(11).await.unwrap();
    assert_eq!(state.watermark, Some(11));
}

#[tokio::test]
async fn test_gaps_are_merged_and_closed() {
    let store = store();
    store
        .add_gaps(&[LayerRange::new(5, 7), LayerRange::new(1, 2), LayerRange::new(8, 9)])
        .await
        .unwrap();
    assert_eq!(
        store.sync_state().await.unwrap().gaps,
        vec![LayerRange::new(1, 2), LayerRange::new(5, 9)]
    );

    let state = store.close_gap(LayerRange::new(5, 6)).await.unwrap();
    assert_eq!(state.gaps, vec![LayerRange::new(1, 2), LayerRange::new(7, 9)]);
}

// =============================================================================
// Range queries
// =============================================================================

#[tokio::test]
async fn test_collect_range_filters_by_layer() {
    let store = store();
    for layer in [9u32, 10, 11, 20] {
        store
            .put_layer(&Layer {
                number: layer,
                blocks: vec![],
                timestamp: 0,
            })
            .await
            .unwrap();
        store.put_transaction(&tx(&format!("tx-{layer}"), layer)).await.unwrap();
    }
    store.upsert_activation(&atx("atx-10", "s1", "cb1", 10, 1)).await.unwrap();
    store.upsert_activation(&atx("atx-25", "s2", "cb2", 25, 2)).await.unwrap();

    let contents = store.collect_range(LayerRange::new(10, 19)).await.unwrap();
    assert_eq!(contents.layers, vec![10, 11]);
    assert_eq!(contents.transactions.len(), 2);
    assert_eq!(contents.activations.len(), 1);
    assert_eq!(contents.activations[0].id, "atx-10");

    let stored = store.stored_layers(LayerRange::new(0, u32::MAX)).await.unwrap();
    assert_eq!(stored, vec![9, 10, 11, 20]);
}

#[tokio::test]
async fn test_accounts_counted_by_created_layer() {
    let store = store();
    let account = |address: &str, layer: u32| Account {
        address: address.to_string(),
        balance: 1,
        nonce: 0,
        created_layer: layer,
        layer_updated: layer,
    };

    store.upsert_account(&account("sm1early", 12)).await.unwrap();
    store.upsert_account(&account("sm1late", 15)).await.unwrap();
    store.upsert_account(&account("sm1other", 30)).await.unwrap();
    assert_eq!(store.collect_range(LayerRange::new(10, 19)).await.unwrap().accounts_created, 2);

    // a backfilled sighting moves the account into an earlier range
    store.upsert_account(&account("sm1early", 4)).await.unwrap();
    store.upsert_account(&account("sm1late", 17)).await.unwrap();

    assert_eq!(store.collect_range(LayerRange::new(0, 9)).await.unwrap().accounts_created, 1);
    assert_eq!(store.collect_range(LayerRange::new(10, 19)).await.unwrap().accounts_created, 1);
    assert_eq!(store.collect_range(LayerRange::new(20, 39)).await.unwrap().accounts_created, 1);
}

#[tokio::test]
async fn test_exists_probe() {
    let store = store();
    store.put_transaction(&tx(&hash_id('b'), 1)).await.unwrap();

    assert!(store.exists(Collection::Transactions, &hash_id('b')).await.unwrap());
    assert!(!store.exists(Collection::Activations, &hash_id('b')).await.unwrap());
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test]
async fn test_slow_backend_times_out() {
    let store = EntityStoreService::in_memory(StoreConfig {
        call_timeout: Duration::from_millis(20),
    });
    store.backend().set_latency(Some(Duration::from_millis(200)));

    let err = store.sync_state().await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout { operation: "sync_state", .. }));
    assert!(err.class().is_retryable());
}
