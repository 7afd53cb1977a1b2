//! Blocking store operations.
//!
//! Read-modify-write operations here must run under the service's write
//! guard; plain puts and reads need no guard.

use shared_types::{
    merge_ranges, subtract_range, Account, Activation, CoinbaseEntry, LayerNumber, LayerRange,
    ObjectId, Reward, RewardRecord, Smesher, SyncState, Transaction,
};
use tracing::debug;

use crate::domain::collections::{
    decode_layer, decode_layer_index_key, layer_index_key, layer_key, layer_upper_bound,
    reward_origin_key, smesher_activation_key, smesher_activations_prefix, string_key,
    SYNC_STATE_KEY,
};
use crate::domain::document::{decode, encode};
use crate::domain::{Collection, Document, IndexKind, RangeContents, StoreError};
use crate::ports::outbound::{BatchOperation, DocumentBackend};

pub(crate) fn get_doc<D, B>(backend: &B, key: &[u8]) -> Result<Option<D>, StoreError>
where
    D: Document,
    B: DocumentBackend + ?Sized,
{
    backend
        .get(D::COLLECTION, key)?
        .map(|bytes| decode::<D>(&bytes))
        .transpose()
}

pub(crate) fn put_op<D: Document>(doc: &D) -> Result<BatchOperation, StoreError> {
    Ok(BatchOperation::put(D::COLLECTION, doc.key(), encode(doc)?))
}

fn index_op(layer: LayerNumber, kind: IndexKind, id: &[u8]) -> BatchOperation {
    BatchOperation::put(Collection::LayerIndex, layer_index_key(layer, kind, id), Vec::new())
}

pub(crate) fn put_doc<D, B>(backend: &B, doc: &D) -> Result<(), StoreError>
where
    D: Document,
    B: DocumentBackend + ?Sized,
{
    backend.write_batch(vec![put_op(doc)?])
}

pub(crate) fn put_transaction<B: DocumentBackend + ?Sized>(
    backend: &B,
    tx: &Transaction,
) -> Result<(), StoreError> {
    backend.write_batch(vec![
        put_op(tx)?,
        index_op(tx.layer, IndexKind::Transaction, tx.id.as_bytes()),
    ])
}

/// Store an activation and fold it into its smesher and the coinbase index.
///
/// One batch covers the activation, its index entries, the smesher and every
/// coinbase entry touched, so the smesher/coinbase pair is never observed
/// half-updated. Attributes only move forward by timestamp; `atx_count` is
/// recounted from the activation index. An activation already recorded for
/// its smesher changes nothing else, and a coinbase only moves to a claim
/// that is newer than its current owner's, so the result does not depend on
/// the order activations are applied in.
pub(crate) fn apply_activation<B: DocumentBackend + ?Sized>(
    backend: &B,
    atx: &Activation,
) -> Result<Smesher, StoreError> {
    let entry_key = smesher_activation_key(&atx.smesher_id, &atx.id);
    let mut ops = vec![
        put_op(atx)?,
        BatchOperation::put(Collection::SmesherActivations, entry_key.clone(), Vec::new()),
        index_op(atx.layer, IndexKind::Activation, atx.id.as_bytes()),
    ];

    let recorded = backend.scan_prefix(
        Collection::SmesherActivations,
        &smesher_activations_prefix(&atx.smesher_id),
    )?;
    let already_recorded = recorded.iter().any(|(k, _)| *k == entry_key);
    let total = recorded.len() + usize::from(!already_recorded);
    let atx_count = u32::try_from(total).unwrap_or(u32::MAX);

    let existing: Option<Smesher> = get_doc(backend, &string_key(&atx.smesher_id))?;
    let supersedes = existing
        .as_ref()
        .map_or(true, |s| atx.timestamp >= s.timestamp);

    let smesher = match existing {
        Some(stored) if already_recorded || !supersedes => Smesher { atx_count, ..stored },
        previous => {
            if let Some(prev) = previous.as_ref() {
                if !prev.coinbase.is_empty() && prev.coinbase != atx.coinbase {
                    let old: Option<CoinbaseEntry> = get_doc(backend, &string_key(&prev.coinbase))?;
                    if old.is_some_and(|entry| entry.smesher_id == atx.smesher_id) {
                        ops.push(BatchOperation::delete(
                            Collection::Coinbases,
                            string_key(&prev.coinbase),
                        ));
                    }
                }
            }

            let coinbase = if atx.coinbase.is_empty() {
                String::new()
            } else if claim_coinbase(backend, atx, &mut ops)? {
                atx.coinbase.clone()
            } else {
                debug!(
                    coinbase = %atx.coinbase,
                    smesher = %atx.smesher_id,
                    "[mx-01] coinbase held by a newer claim"
                );
                String::new()
            };

            Smesher {
                id: atx.smesher_id.clone(),
                coinbase,
                commitment_size: atx.commitment_size,
                atx_count,
                timestamp: atx.timestamp,
            }
        }
    };

    ops.push(put_op(&smesher)?);
    backend.write_batch(ops)?;
    Ok(smesher)
}

/// Point `atx.coinbase` at `atx.smesher_id` unless another smesher holds it
/// with a newer claim. Ties go to the larger smesher id.
fn claim_coinbase<B: DocumentBackend + ?Sized>(
    backend: &B,
    atx: &Activation,
    ops: &mut Vec<BatchOperation>,
) -> Result<bool, StoreError> {
    let current: Option<CoinbaseEntry> = get_doc(backend, &string_key(&atx.coinbase))?;
    if let Some(entry) = current.filter(|e| e.smesher_id != atx.smesher_id) {
        let owner: Option<Smesher> = get_doc(backend, &string_key(&entry.smesher_id))?;
        if let Some(mut owner) = owner.filter(|s| s.coinbase == atx.coinbase) {
            if (owner.timestamp, owner.id.as_str()) >= (atx.timestamp, atx.smesher_id.as_str()) {
                return Ok(false);
            }
            debug!(
                coinbase = %atx.coinbase,
                from = %owner.id,
                to = %atx.smesher_id,
                "[mx-01] coinbase moved to another smesher"
            );
            owner.coinbase.clear();
            ops.push(put_op(&owner)?);
        }
    }
    ops.push(put_op(&CoinbaseEntry {
        address: atx.coinbase.clone(),
        smesher_id: atx.smesher_id.clone(),
    })?);
    Ok(true)
}

/// Store a reward, reusing the id already assigned to its natural key.
pub(crate) fn upsert_reward<B: DocumentBackend + ?Sized>(
    backend: &B,
    record: &RewardRecord,
) -> Result<ObjectId, StoreError> {
    let origin = reward_origin_key(record.layer, &record.smesher_id);
    let id = match backend.get(Collection::RewardOrigins, &origin)? {
        Some(bytes) => {
            let raw: [u8; 12] = bytes.as_slice().try_into().map_err(|_| StoreError::Mapping {
                collection: Collection::RewardOrigins.name(),
                message: format!("expected 12-byte object id, got {} bytes", bytes.len()),
            })?;
            ObjectId::from_bytes(raw)
        }
        None => ObjectId::new(),
    };

    let reward = Reward::from_record(id, record);
    backend.write_batch(vec![
        put_op(&reward)?,
        BatchOperation::put(Collection::RewardOrigins, origin, id.as_bytes().to_vec()),
        index_op(record.layer, IndexKind::Reward, id.as_bytes()),
    ])?;
    Ok(id)
}

pub(crate) fn upsert_account<B: DocumentBackend + ?Sized>(
    backend: &B,
    incoming: &Account,
) -> Result<Account, StoreError> {
    let existing: Option<Account> = get_doc(backend, &string_key(&incoming.address))?;
    let merged = match &existing {
        Some(stored) => stored.merged_with(incoming),
        None => incoming.clone(),
    };
    if existing.as_ref() == Some(&merged) {
        return Ok(merged);
    }

    let address = merged.address.as_bytes();
    let mut ops = vec![put_op(&merged)?];
    match &existing {
        Some(stored) if stored.created_layer == merged.created_layer => {}
        stored => {
            if let Some(stored) = stored {
                ops.push(BatchOperation::delete(
                    Collection::LayerIndex,
                    layer_index_key(stored.created_layer, IndexKind::Account, address),
                ));
            }
            ops.push(index_op(merged.created_layer, IndexKind::Account, address));
        }
    }
    backend.write_batch(ops)?;
    Ok(merged)
}

pub(crate) fn read_sync_state<B: DocumentBackend + ?Sized>(
    backend: &B,
) -> Result<SyncState, StoreError> {
    Ok(get_doc(backend, SYNC_STATE_KEY)?.unwrap_or_default())
}

/// Read-modify-write the sync cursor. Gaps are re-merged after `change`.
pub(crate) fn update_sync_state<B, F>(backend: &B, change: F) -> Result<SyncState, StoreError>
where
    B: DocumentBackend + ?Sized,
    F: FnOnce(&mut SyncState),
{
    let before = read_sync_state(backend)?;
    let mut state = before.clone();
    change(&mut state);
    let gaps = std::mem::take(&mut state.gaps);
    state.gaps = merge_ranges(gaps);
    if state != before {
        put_doc(backend, &state)?;
    }
    Ok(state)
}

pub(crate) fn advance_watermark(state: &mut SyncState, layer: LayerNumber) {
    match state.watermark {
        Some(w) if layer < w => {
            debug!(stored = w, requested = layer, "[mx-01] watermark kept, replayed layer below it");
        }
        _ => state.watermark = Some(layer),
    }
}

pub(crate) fn close_gap(state: &mut SyncState, range: LayerRange) {
    state.gaps = subtract_range(&state.gaps, range);
}

pub(crate) fn stored_layers<B: DocumentBackend + ?Sized>(
    backend: &B,
    range: LayerRange,
) -> Result<Vec<LayerNumber>, StoreError> {
    let end = layer_upper_bound(range.end);
    Ok(backend
        .scan(Collection::Layers, &layer_key(range.start), end.as_deref())?
        .iter()
        .filter_map(|(k, _)| decode_layer(k))
        .collect())
}

pub(crate) fn collect_range<B: DocumentBackend + ?Sized>(
    backend: &B,
    range: LayerRange,
) -> Result<RangeContents, StoreError> {
    let mut contents = RangeContents {
        layers: stored_layers(backend, range)?,
        ..Default::default()
    };

    let end = layer_upper_bound(range.end);
    let entries = backend.scan(Collection::LayerIndex, &layer_key(range.start), end.as_deref())?;
    for (key, _) in &entries {
        let Some((_, kind, id)) = decode_layer_index_key(key) else {
            continue;
        };
        match kind {
            IndexKind::Transaction => {
                if let Some(tx) = get_doc::<Transaction, _>(backend, id)? {
                    contents.transactions.push(tx);
                }
            }
            IndexKind::Activation => {
                if let Some(atx) = get_doc::<Activation, _>(backend, id)? {
                    contents.activations.push(atx);
                }
            }
            IndexKind::Reward => {
                if let Some(reward) = get_doc::<Reward, _>(backend, id)? {
                    contents.rewards.push(reward);
                }
            }
            IndexKind::Account => contents.accounts_created += 1,
        }
    }

    Ok(contents)
}

pub(crate) fn list_all<D, B>(backend: &B) -> Result<Vec<D>, StoreError>
where
    D: Document,
    B: DocumentBackend + ?Sized,
{
    backend
        .scan(D::COLLECTION, &[], None)?
        .iter()
        .map(|(_, bytes)| decode::<D>(bytes))
        .collect()
}
