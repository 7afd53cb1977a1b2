//! # Document Mapping
//!
//! The only place that turns typed records into stored bytes and back.
//! Everything above this module works with `shared_types` records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    Account, Activation, Block, CoinbaseEntry, Epoch, Layer, Reward, Smesher, SyncState,
    Transaction,
};

use super::collections::{
    layer_key, object_id_key, string_key, Collection, SYNC_STATE_KEY,
};
use super::errors::StoreError;

/// A record stored in exactly one collection under its natural key.
pub trait Document: Serialize + DeserializeOwned + Send + 'static {
    const COLLECTION: Collection;

    fn key(&self) -> Vec<u8>;
}

impl Document for Layer {
    const COLLECTION: Collection = Collection::Layers;
    fn key(&self) -> Vec<u8> {
        layer_key(self.number)
    }
}

impl Document for Epoch {
    const COLLECTION: Collection = Collection::Epochs;
    fn key(&self) -> Vec<u8> {
        layer_key(self.number)
    }
}

impl Document for Account {
    const COLLECTION: Collection = Collection::Accounts;
    fn key(&self) -> Vec<u8> {
        string_key(&self.address)
    }
}

impl Document for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
    fn key(&self) -> Vec<u8> {
        string_key(&self.id)
    }
}

impl Document for Activation {
    const COLLECTION: Collection = Collection::Activations;
    fn key(&self) -> Vec<u8> {
        string_key(&self.id)
    }
}

impl Document for Smesher {
    const COLLECTION: Collection = Collection::Smeshers;
    fn key(&self) -> Vec<u8> {
        string_key(&self.id)
    }
}

impl Document for CoinbaseEntry {
    const COLLECTION: Collection = Collection::Coinbases;
    fn key(&self) -> Vec<u8> {
        string_key(&self.address)
    }
}

impl Document for Reward {
    const COLLECTION: Collection = Collection::Rewards;
    fn key(&self) -> Vec<u8> {
        object_id_key(&self.id)
    }
}

impl Document for Block {
    const COLLECTION: Collection = Collection::Blocks;
    fn key(&self) -> Vec<u8> {
        string_key(&self.id)
    }
}

impl Document for SyncState {
    const COLLECTION: Collection = Collection::SyncState;
    fn key(&self) -> Vec<u8> {
        SYNC_STATE_KEY.to_vec()
    }
}

pub fn encode<D: Document>(doc: &D) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(doc).map_err(|e| StoreError::Mapping {
        collection: D::COLLECTION.name(),
        message: e.to_string(),
    })
}

pub fn decode<D: Document>(bytes: &[u8]) -> Result<D, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Mapping {
        collection: D::COLLECTION.name(),
        message: e.to_string(),
    })
}
