//! # Collections and Keys
//!
//! Logical collections map 1:1 onto backend namespaces (RocksDB column
//! families). Numeric key parts are big-endian so range scans come back in
//! layer order.

use shared_types::{LayerNumber, ObjectId};

/// A logical collection (typed table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Layers,
    Epochs,
    Accounts,
    Transactions,
    Activations,
    Smeshers,
    Coinbases,
    Rewards,
    Blocks,
    SyncState,
    /// smesher id + 0x00 + activation id → empty.
    SmesherActivations,
    /// layer + smesher id → reward id.
    RewardOrigins,
    /// layer + kind + id → empty.
    LayerIndex,
}

impl Collection {
    /// Every collection, in column family creation order.
    pub const ALL: [Collection; 13] = [
        Collection::Layers,
        Collection::Epochs,
        Collection::Accounts,
        Collection::Transactions,
        Collection::Activations,
        Collection::Smeshers,
        Collection::Coinbases,
        Collection::Rewards,
        Collection::Blocks,
        Collection::SyncState,
        Collection::SmesherActivations,
        Collection::RewardOrigins,
        Collection::LayerIndex,
    ];

    /// Backend namespace name.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Layers => "layers",
            Collection::Epochs => "epochs",
            Collection::Accounts => "accounts",
            Collection::Transactions => "transactions",
            Collection::Activations => "activations",
            Collection::Smeshers => "smeshers",
            Collection::Coinbases => "coinbases",
            Collection::Rewards => "rewards",
            Collection::Blocks => "blocks",
            Collection::SyncState => "sync_state",
            Collection::SmesherActivations => "smesher_activations",
            Collection::RewardOrigins => "reward_origins",
            Collection::LayerIndex => "layer_index",
        }
    }
}

/// Entry kinds recorded in [`Collection::LayerIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexKind {
    Transaction = b't',
    Activation = b'a',
    Reward = b'r',
    /// Keyed on the account's `created_layer`.
    Account = b'c',
}

impl IndexKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b't' => Some(IndexKind::Transaction),
            b'a' => Some(IndexKind::Activation),
            b'r' => Some(IndexKind::Reward),
            b'c' => Some(IndexKind::Account),
            _ => None,
        }
    }
}

/// Single key of the sync cursor record.
pub const SYNC_STATE_KEY: &[u8] = b"state";

const SEPARATOR: u8 = 0x00;

pub fn layer_key(layer: LayerNumber) -> Vec<u8> {
    layer.to_be_bytes().to_vec()
}

/// Decode a big-endian layer number from the first four bytes of a key.
pub fn decode_layer(key: &[u8]) -> Option<LayerNumber> {
    let bytes: [u8; 4] = key.get(..4)?.try_into().ok()?;
    Some(LayerNumber::from_be_bytes(bytes))
}

pub fn string_key(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}

pub fn object_id_key(id: &ObjectId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Prefix of every activation id recorded for a smesher.
pub fn smesher_activations_prefix(smesher_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(smesher_id.len() + 1);
    key.extend_from_slice(smesher_id.as_bytes());
    key.push(SEPARATOR);
    key
}

pub fn smesher_activation_key(smesher_id: &str, activation_id: &str) -> Vec<u8> {
    let mut key = smesher_activations_prefix(smesher_id);
    key.extend_from_slice(activation_id.as_bytes());
    key
}

pub fn reward_origin_key(layer: LayerNumber, smesher_id: &str) -> Vec<u8> {
    let mut key = layer_key(layer);
    key.extend_from_slice(smesher_id.as_bytes());
    key
}

pub fn layer_index_key(layer: LayerNumber, kind: IndexKind, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(5 + id.len());
    key.extend_from_slice(&layer.to_be_bytes());
    key.push(kind as u8);
    key.extend_from_slice(id);
    key
}

/// Split a layer index key into its parts.
pub fn decode_layer_index_key(key: &[u8]) -> Option<(LayerNumber, IndexKind, &[u8])> {
    let layer = decode_layer(key)?;
    let kind = IndexKind::from_byte(*key.get(4)?)?;
    Some((layer, kind, &key[5..]))
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// `None` when the prefix is all `0xff` (scan to the end).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Exclusive upper bound for a scan covering layers `..=layer`.
pub fn layer_upper_bound(layer: LayerNumber) -> Option<Vec<u8>> {
    layer.checked_add(1).map(layer_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_keys_sort_numerically() {
        let mut keys = vec![layer_key(256), layer_key(1), layer_key(65_536), layer_key(2)];
        keys.sort();
        let decoded: Vec<_> = keys.iter().map(|k| decode_layer(k).unwrap()).collect();
        assert_eq!(decoded, vec![1, 2, 256, 65_536]);
    }

    #[test]
    fn test_prefix_successor() {
        assert_eq!(prefix_successor(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_successor(&[0x01, 0xff]), Some(vec![0x02]));
        assert_eq!(prefix_successor(&[0xff, 0xff]), None);
    }

    #[test]
    fn test_layer_index_key_roundtrip() {
        let key = layer_index_key(7, IndexKind::Activation, b"0xabc");
        let (layer, kind, id) = decode_layer_index_key(&key).unwrap();
        assert_eq!(layer, 7);
        assert_eq!(kind, IndexKind::Activation);
        assert_eq!(id, b"0xabc");
    }

    #[test]
    fn test_smesher_prefix_does_not_match_longer_ids() {
        let key = smesher_activation_key("0xaa11", "atx");
        assert!(key.starts_with(&smesher_activations_prefix("0xaa11")));
        assert!(!key.starts_with(&smesher_activations_prefix("0xaa")));
    }

    #[test]
    fn test_collection_names_unique() {
        let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
    }
}
