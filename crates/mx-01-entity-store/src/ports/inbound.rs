//! # Inbound Ports (Driving Ports)
//!
//! The API the sync engine, gap scanner, stats recalculator and search
//! resolver call.

use async_trait::async_trait;
use shared_types::{
    Account, Activation, Block, CoinbaseEntry, Epoch, EpochNumber, Layer, LayerNumber, LayerRange,
    ObjectId, Reward, RewardRecord, Smesher, SyncState, Transaction,
};

use crate::domain::{Collection, RangeContents, StoreError};

/// Idempotent persistence over typed collections.
///
/// Every write is an upsert keyed by a natural identifier. Writing the same
/// record twice leaves the store exactly as writing it once.
#[async_trait]
pub trait EntityStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Immutable chain records
    // -------------------------------------------------------------------------

    /// Store a layer record. Written last during ingestion; its presence marks
    /// the layer as fully stored.
    async fn put_layer(&self, layer: &Layer) -> Result<(), StoreError>;

    async fn put_block(&self, block: &Block) -> Result<(), StoreError>;

    async fn put_transaction(&self, tx: &Transaction) -> Result<(), StoreError>;

    /// Store an activation and fold it into its smesher and the coinbase
    /// index, in one atomic batch. Returns the smesher as stored.
    async fn upsert_activation(&self, activation: &Activation) -> Result<Smesher, StoreError>;

    /// Store a reward. A reward already stored for the same layer and smesher
    /// keeps its id.
    async fn upsert_reward(&self, reward: &RewardRecord) -> Result<ObjectId, StoreError>;

    /// Merge an account snapshot (newest `layer_updated` wins). Returns the
    /// stored snapshot.
    async fn upsert_account(&self, account: &Account) -> Result<Account, StoreError>;

    /// Overwrite an epoch aggregate in one put.
    async fn put_epoch(&self, epoch: &Epoch) -> Result<(), StoreError>;

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    async fn get_layer(&self, number: LayerNumber) -> Result<Option<Layer>, StoreError>;

    async fn get_epoch(&self, number: EpochNumber) -> Result<Option<Epoch>, StoreError>;

    async fn get_account(&self, address: &str) -> Result<Option<Account>, StoreError>;

    async fn get_block(&self, id: &str) -> Result<Option<Block>, StoreError>;

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    async fn get_activation(&self, id: &str) -> Result<Option<Activation>, StoreError>;

    async fn get_smesher(&self, id: &str) -> Result<Option<Smesher>, StoreError>;

    async fn get_coinbase(&self, address: &str) -> Result<Option<CoinbaseEntry>, StoreError>;

    async fn get_reward(&self, id: &ObjectId) -> Result<Option<Reward>, StoreError>;

    /// Existence probe by string id (accounts, blocks, transactions,
    /// activations, smeshers, coinbases).
    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    async fn reward_exists(&self, id: &ObjectId) -> Result<bool, StoreError>;

    /// Every smesher record.
    async fn list_smeshers(&self) -> Result<Vec<Smesher>, StoreError>;

    /// Every coinbase index entry.
    async fn list_coinbases(&self) -> Result<Vec<CoinbaseEntry>, StoreError>;

    // -------------------------------------------------------------------------
    // Range queries
    // -------------------------------------------------------------------------

    /// Layer numbers with a stored layer record in `range`, ascending.
    async fn stored_layers(&self, range: LayerRange) -> Result<Vec<LayerNumber>, StoreError>;

    /// Everything stored for `range`, for aggregation.
    async fn collect_range(&self, range: LayerRange) -> Result<RangeContents, StoreError>;

    // -------------------------------------------------------------------------
    // Sync cursor
    // -------------------------------------------------------------------------

    async fn sync_state(&self) -> Result<SyncState, StoreError>;

    /// Raise the watermark to `layer`. Never lowers it.
    async fn advance_watermark(&self, layer: LayerNumber) -> Result<SyncState, StoreError>;

    /// Record gaps pending backfill (merged with the known ones).
    async fn add_gaps(&self, gaps: &[LayerRange]) -> Result<SyncState, StoreError>;

    /// Remove `range` from the gap list.
    async fn close_gap(&self, range: LayerRange) -> Result<SyncState, StoreError>;
}
