//! Everything the node reports for one layer.

use serde::{Deserialize, Serialize};
use shared_types::{Account, Activation, Block, Layer, LayerNumber, RewardRecord, Transaction};

/// Immutable view of one layer as served by the node.
///
/// Rewards arrive without ids; the store assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub layer: Layer,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub activations: Vec<Activation>,
    #[serde(default)]
    pub rewards: Vec<RewardRecord>,
    /// Account states as of this layer.
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl LayerSnapshot {
    /// Snapshot of a layer with nothing in it.
    pub fn empty(number: LayerNumber, timestamp: u64) -> Self {
        Self {
            layer: Layer {
                number,
                blocks: Vec::new(),
                timestamp,
            },
            blocks: Vec::new(),
            transactions: Vec::new(),
            activations: Vec::new(),
            rewards: Vec::new(),
            accounts: Vec::new(),
        }
    }

    pub fn number(&self) -> LayerNumber {
        self.layer.number
    }

    /// Every account address referenced by the snapshot.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        let tx_addresses = self
            .transactions
            .iter()
            .flat_map(|tx| [tx.sender.as_str(), tx.recipient.as_str()]);
        let coinbases = self
            .activations
            .iter()
            .map(|atx| atx.coinbase.as_str())
            .chain(self.rewards.iter().map(|r| r.coinbase.as_str()));
        let accounts = self.accounts.iter().map(|a| a.address.as_str());

        tx_addresses
            .chain(coinbases)
            .chain(accounts)
            .filter(|address| !address.is_empty())
    }
}
