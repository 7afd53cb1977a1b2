//! # Core Domain Entities
//!
//! Records indexed from the node's ledger.
//!
//! ## Lifecycle
//!
//! - **Immutable once written**: `Layer`, `Block`, `Transaction`, `Activation`,
//!   `Reward`. Re-ingesting a layer writes byte-identical records.
//! - **Snapshots**: `Account` holds the latest known balance/nonce, newest
//!   snapshot wins.
//! - **Mutable**: `Smesher` (updated on every activation) and its
//!   `CoinbaseEntry` reverse index.
//! - **Derived**: `Epoch` aggregates.
//! - **Cursor**: `SyncState`, the durable resumption point.

use serde::{Deserialize, Serialize};

use crate::layer_range::LayerRange;
use crate::object_id::ObjectId;

/// Layer sequence number.
pub type LayerNumber = u32;

/// Epoch sequence number (`layer / layers_per_epoch`).
pub type EpochNumber = u32;

/// Literal length of an account address in the default HRP scheme.
pub const ADDRESS_LENGTH: usize = 42;

/// Literal length of a `0x`-prefixed 32-byte hex id (transactions,
/// activations, smeshers).
pub const HASH_ID_LENGTH: usize = 66;

// =============================================================================
// CHAIN DATA
// =============================================================================

/// One step of the layer clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer number.
    pub number: LayerNumber,
    /// Ids of the blocks applied in this layer.
    pub blocks: Vec<String>,
    /// Unix timestamp of the layer start.
    pub timestamp: u64,
}

/// A block applied in a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block id.
    pub id: String,
    /// Layer the block belongs to.
    pub layer: LayerNumber,
    /// Transactions included by the block.
    pub tx_ids: Vec<String>,
}

/// Latest known state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address (42 chars in the default HRP scheme).
    pub address: String,
    /// Balance as of `layer_updated`.
    pub balance: u64,
    /// Nonce as of `layer_updated`.
    pub nonce: u64,
    /// First layer the account was seen in.
    pub created_layer: LayerNumber,
    /// Layer the snapshot was taken at.
    pub layer_updated: LayerNumber,
}

impl Account {
    /// Merge an incoming snapshot into the stored one.
    ///
    /// The snapshot with the higher `layer_updated` wins; `created_layer`
    /// keeps the earliest layer either side has seen. Merging is commutative,
    /// so live sync and backfill can race on the same address.
    pub fn merged_with(&self, incoming: &Account) -> Account {
        let created_layer = self.created_layer.min(incoming.created_layer);
        let mut newest = if incoming.layer_updated >= self.layer_updated {
            incoming.clone()
        } else {
            self.clone()
        };
        newest.created_layer = created_layer;
        newest
    }
}

/// Execution status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Applied to state.
    Applied,
    /// Included but execution failed.
    Failed,
    /// Included in a block that was not applied.
    Rejected,
}

/// A transaction included in a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// 66-char hex id.
    pub id: String,
    /// Sender address.
    pub sender: String,
    /// Recipient address.
    pub recipient: String,
    /// Transferred amount.
    pub amount: u64,
    /// Fee paid.
    pub fee: u64,
    /// Layer the transaction was applied in.
    pub layer: LayerNumber,
    /// Execution status.
    pub status: TxStatus,
}

/// An activation (ATX): a smesher's proof of committed storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// 66-char hex id.
    pub id: String,
    /// Smesher that published the activation.
    pub smesher_id: String,
    /// Coinbase address declared by the activation.
    pub coinbase: String,
    /// Layer the activation was received in.
    pub layer: LayerNumber,
    /// Committed storage in bytes.
    pub commitment_size: u64,
    /// Unix timestamp of publication.
    pub timestamp: u64,
}

/// A network participant identity. The one mutable chain entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Smesher {
    /// 66-char hex id.
    pub id: String,
    /// Current coinbase address; empty when displaced by another smesher.
    pub coinbase: String,
    /// Latest committed storage in bytes.
    pub commitment_size: u64,
    /// Number of activation records referencing this smesher.
    pub atx_count: u32,
    /// Timestamp of the activation the attributes were taken from.
    pub timestamp: u64,
}

/// Reverse index entry: coinbase address to smesher id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseEntry {
    /// Coinbase address (unique).
    pub address: String,
    /// Smesher currently using this coinbase.
    pub smesher_id: String,
}

/// A reward as reported by the node, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    /// Smesher that earned the reward.
    pub smesher_id: String,
    /// Account credited.
    pub coinbase: String,
    /// Layer the reward was paid in.
    pub layer: LayerNumber,
    /// Total reward (layer reward plus fees).
    pub total: u64,
    /// Layer reward component.
    pub layer_reward: u64,
}

/// A stored reward with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Store-assigned object id.
    pub id: ObjectId,
    /// Smesher that earned the reward.
    pub smesher_id: String,
    /// Account credited.
    pub coinbase: String,
    /// Layer the reward was paid in.
    pub layer: LayerNumber,
    /// Total reward (layer reward plus fees).
    pub total: u64,
    /// Layer reward component.
    pub layer_reward: u64,
}

impl Reward {
    /// Attach a store-assigned id to a node reward.
    pub fn from_record(id: ObjectId, record: &RewardRecord) -> Self {
        Self {
            id,
            smesher_id: record.smesher_id.clone(),
            coinbase: record.coinbase.clone(),
            layer: record.layer,
            total: record.total,
            layer_reward: record.layer_reward,
        }
    }
}

// =============================================================================
// DERIVED DATA
// =============================================================================

/// Aggregates over one epoch's layer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EpochStats {
    /// Layer records stored for the epoch.
    pub layers: u32,
    /// Accounts first seen in the epoch.
    pub accounts: u64,
    /// Transactions applied in the epoch.
    pub transactions: u64,
    /// Activations received in the epoch.
    pub activations: u64,
    /// Distinct smeshers with an activation in the epoch.
    pub smeshers: u64,
    /// Sum of reward totals paid in the epoch.
    pub rewards_total: u64,
    /// Sum of committed storage declared by the epoch's activations.
    pub commitment_total: u64,
}

/// Cached epoch aggregate. Never hand-edited; always recomputable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    /// Epoch number.
    pub number: EpochNumber,
    /// First layer of the epoch.
    pub first_layer: LayerNumber,
    /// Last layer of the epoch.
    pub last_layer: LayerNumber,
    /// Aggregates.
    pub stats: EpochStats,
}

// =============================================================================
// SYNC CURSOR
// =============================================================================

/// Durable sync cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncState {
    /// Highest layer fully ingested by live sync. `None` before the first layer.
    pub watermark: Option<LayerNumber>,
    /// Ranges below the watermark pending backfill, sorted and merged.
    pub gaps: Vec<LayerRange>,
}

impl SyncState {
    /// Watermark, treating "nothing synced" as layer 0.
    pub fn watermark_or_zero(&self) -> LayerNumber {
        self.watermark.unwrap_or(0)
    }

    /// Layer live sync should apply next.
    pub fn next_layer(&self) -> LayerNumber {
        self.watermark.map_or(0, |w| w.saturating_add(1))
    }
}
