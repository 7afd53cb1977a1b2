//! Epoch aggregates computed from stored layer contents.

use std::collections::HashSet;

use mx_01_entity_store::RangeContents;
use shared_types::EpochStats;

/// Aggregate everything stored for an epoch's layer range.
///
/// Pure: the same contents always give the same stats.
pub fn compute_epoch_stats(contents: &RangeContents) -> EpochStats {
    let smeshers: HashSet<&str> = contents
        .activations
        .iter()
        .map(|atx| atx.smesher_id.as_str())
        .collect();

    EpochStats {
        layers: u32::try_from(contents.layers.len()).unwrap_or(u32::MAX),
        accounts: contents.accounts_created,
        transactions: contents.transactions.len() as u64,
        activations: contents.activations.len() as u64,
        smeshers: smeshers.len() as u64,
        rewards_total: contents
            .rewards
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.total)),
        commitment_total: contents
            .activations
            .iter()
            .fold(0u64, |sum, atx| sum.saturating_add(atx.commitment_size)),
    }
}
