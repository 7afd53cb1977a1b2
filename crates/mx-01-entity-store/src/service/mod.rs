//! # Entity Store Service
//!
//! Async application service implementing [`EntityStore`] over any
//! [`DocumentBackend`].
//!
//! ## Call Model
//!
//! Every backend call runs on the blocking pool under
//! `tokio::time::timeout(call_timeout)`. An elapsed call returns
//! `StoreError::Timeout`; the blocking work itself is left to finish.
//!
//! Read-modify-write operations (smesher/coinbase pair, rewards, accounts,
//! sync cursor) serialize on one write guard so live sync and backfill workers
//! cannot interleave their reads and writes on the same record.

mod writes;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    Account, Activation, Block, CoinbaseEntry, Epoch, EpochNumber, Layer, LayerNumber, LayerRange,
    ObjectId, Reward, RewardRecord, Smesher, SyncState, Transaction,
};
use tracing::warn;

use crate::adapters::InMemoryBackend;
use crate::config::StoreConfig;
use crate::domain::collections::{layer_key, object_id_key, string_key};
use crate::domain::{Collection, Document, RangeContents, StoreError};
use crate::ports::inbound::EntityStore;
use crate::ports::outbound::DocumentBackend;

/// Entity store over a document backend.
pub struct EntityStoreService<B: DocumentBackend> {
    backend: Arc<B>,
    write_guard: Arc<Mutex<()>>,
    config: StoreConfig,
}

impl EntityStoreService<InMemoryBackend> {
    /// Service over a fresh in-memory backend.
    pub fn in_memory(config: StoreConfig) -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), config)
    }
}

impl<B: DocumentBackend> EntityStoreService<B> {
    pub fn new(backend: Arc<B>, config: StoreConfig) -> Self {
        Self {
            backend,
            write_guard: Arc::new(Mutex::new(())),
            config,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run a blocking backend call under the per-call timeout.
    async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T, StoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let task = tokio::task::spawn_blocking(move || call(&backend));

        match tokio::time::timeout(self.config.call_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(StoreError::TaskFailed {
                operation,
                message: join.to_string(),
            }),
            Err(_) => {
                let timeout_ms = self.config.call_timeout.as_millis() as u64;
                warn!(operation, timeout_ms, "[mx-01] store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms,
                })
            }
        }
    }

    /// Like [`run`](Self::run), holding the write guard for the whole call.
    async fn run_guarded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> Result<T, StoreError> + Send + 'static,
    {
        let guard = Arc::clone(&self.write_guard);
        self.run(operation, move |backend| {
            let _held = guard.lock();
            call(backend)
        })
        .await
    }

    async fn get<D: Document>(
        &self,
        operation: &'static str,
        key: Vec<u8>,
    ) -> Result<Option<D>, StoreError> {
        self.run(operation, move |b| writes::get_doc::<D, B>(b, &key))
            .await
    }

    async fn put<D: Document + Clone + Sync>(
        &self,
        operation: &'static str,
        doc: &D,
    ) -> Result<(), StoreError> {
        let doc = doc.clone();
        self.run(operation, move |b| writes::put_doc(b, &doc)).await
    }
}

#[async_trait]
impl<B: DocumentBackend> EntityStore for EntityStoreService<B> {
    async fn put_layer(&self, layer: &Layer) -> Result<(), StoreError> {
        self.put("put_layer", layer).await
    }

    async fn put_block(&self, block: &Block) -> Result<(), StoreError> {
        self.put("put_block", block).await
    }

    async fn put_transaction(&self, tx: &Transaction) -> Result<(), StoreError> {
        let tx = tx.clone();
        self.run("put_transaction", move |b| writes::put_transaction(b, &tx))
            .await
    }

    async fn upsert_activation(&self, activation: &Activation) -> Result<Smesher, StoreError> {
        let atx = activation.clone();
        self.run_guarded("upsert_activation", move |b| {
            writes::apply_activation(b, &atx)
        })
        .await
    }

    async fn upsert_reward(&self, reward: &RewardRecord) -> Result<ObjectId, StoreError> {
        let record = reward.clone();
        self.run_guarded("upsert_reward", move |b| writes::upsert_reward(b, &record))
            .await
    }

    async fn upsert_account(&self, account: &Account) -> Result<Account, StoreError> {
        let account = account.clone();
        self.run_guarded("upsert_account", move |b| {
            writes::upsert_account(b, &account)
        })
        .await
    }

    async fn put_epoch(&self, epoch: &Epoch) -> Result<(), StoreError> {
        self.put("put_epoch", epoch).await
    }

    async fn get_layer(&self, number: LayerNumber) -> Result<Option<Layer>, StoreError> {
        self.get("get_layer", layer_key(number)).await
    }

    async fn get_epoch(&self, number: EpochNumber) -> Result<Option<Epoch>, StoreError> {
        self.get("get_epoch", layer_key(number)).await
    }

    async fn get_account(&self, address: &str) -> Result<Option<Account>, StoreError> {
        self.get("get_account", string_key(address)).await
    }

    async fn get_block(&self, id: &str) -> Result<Option<Block>, StoreError> {
        self.get("get_block", string_key(id)).await
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        self.get("get_transaction", string_key(id)).await
    }

    async fn get_activation(&self, id: &str) -> Result<Option<Activation>, StoreError> {
        self.get("get_activation", string_key(id)).await
    }

    async fn get_smesher(&self, id: &str) -> Result<Option<Smesher>, StoreError> {
        self.get("get_smesher", string_key(id)).await
    }

    async fn get_coinbase(&self, address: &str) -> Result<Option<CoinbaseEntry>, StoreError> {
        self.get("get_coinbase", string_key(address)).await
    }

    async fn get_reward(&self, id: &ObjectId) -> Result<Option<Reward>, StoreError> {
        self.get("get_reward", object_id_key(id)).await
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let key = string_key(id);
        self.run("exists", move |b| b.exists(collection, &key)).await
    }

    async fn reward_exists(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let key = object_id_key(id);
        self.run("reward_exists", move |b| b.exists(Collection::Rewards, &key))
            .await
    }

    async fn list_smeshers(&self) -> Result<Vec<Smesher>, StoreError> {
        self.run("list_smeshers", |b| writes::list_all::<Smesher, B>(b))
            .await
    }

    async fn list_coinbases(&self) -> Result<Vec<CoinbaseEntry>, StoreError> {
        self.run("list_coinbases", |b| writes::list_all::<CoinbaseEntry, B>(b))
            .await
    }

    async fn stored_layers(&self, range: LayerRange) -> Result<Vec<LayerNumber>, StoreError> {
        self.run("stored_layers", move |b| writes::stored_layers(b, range))
            .await
    }

    async fn collect_range(&self, range: LayerRange) -> Result<RangeContents, StoreError> {
        self.run("collect_range", move |b| writes::collect_range(b, range))
            .await
    }

    async fn sync_state(&self) -> Result<SyncState, StoreError> {
        self.run("sync_state", |b| writes::read_sync_state(b)).await
    }

    async fn advance_watermark(&self, layer: LayerNumber) -> Result<SyncState, StoreError> {
        self.run_guarded("advance_watermark", move |b| {
            writes::update_sync_state(b, |state| writes::advance_watermark(state, layer))
        })
        .await
    }

    async fn add_gaps(&self, gaps: &[LayerRange]) -> Result<SyncState, StoreError> {
        let gaps = gaps.to_vec();
        self.run_guarded("add_gaps", move |b| {
            writes::update_sync_state(b, |state| state.gaps.extend(gaps))
        })
        .await
    }

    async fn close_gap(&self, range: LayerRange) -> Result<SyncState, StoreError> {
        self.run_guarded("close_gap", move |b| {
            writes::update_sync_state(b, |state| writes::close_gap(state, range))
        })
        .await
    }
}
