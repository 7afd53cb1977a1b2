//! # Identifier Classification
//!
//! An identifier carries no type tag. Its literal shape picks the candidate
//! categories, and the probe order among them is fixed: the first category
//! with a stored record wins.
//!
//! | Shape | Candidates, in probe order |
//! |-------|----------------------------|
//! | 42 chars | account, block |
//! | 66 chars | transaction, activation, smesher |
//! | anything else | reward (object id), then layer / epoch (decimal) |

use mx_01_entity_store::Collection;
use shared_types::{EpochNumber, LayerNumber, ADDRESS_LENGTH, HASH_ID_LENGTH};

/// What an identifier can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Account,
    Block,
    Transaction,
    Activation,
    Smesher,
    Reward,
    Layer,
    Epoch,
}

impl Category {
    /// First segment of the redirect path.
    pub fn path_segment(self) -> &'static str {
        match self {
            Category::Account => "address",
            Category::Block => "blocks",
            Category::Transaction => "txs",
            Category::Activation => "atxs",
            Category::Smesher => "smeshers",
            Category::Reward => "rewards",
            Category::Layer => "layers",
            Category::Epoch => "epochs",
        }
    }

    /// Metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Account => "account",
            Category::Block => "block",
            Category::Transaction => "transaction",
            Category::Activation => "activation",
            Category::Smesher => "smesher",
            Category::Reward => "reward",
            Category::Layer => "layer",
            Category::Epoch => "epoch",
        }
    }

    /// Collection probed by string id, for the shape-probed categories.
    pub fn collection(self) -> Option<Collection> {
        match self {
            Category::Account => Some(Collection::Accounts),
            Category::Block => Some(Collection::Blocks),
            Category::Transaction => Some(Collection::Transactions),
            Category::Activation => Some(Collection::Activations),
            Category::Smesher => Some(Collection::Smeshers),
            Category::Reward | Category::Layer | Category::Epoch => None,
        }
    }
}

/// Literal shape of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdShape {
    /// Account address or block id.
    Address,
    /// Transaction, activation or smesher id.
    Hash,
    /// Object id or decimal number.
    Other,
}

pub fn is_address_shaped(id: &str) -> bool {
    id.len() == ADDRESS_LENGTH
}

pub fn is_hash_shaped(id: &str) -> bool {
    id.len() == HASH_ID_LENGTH
}

/// Shape rules, checked in order; the first matching predicate wins.
pub const SHAPE_RULES: [(fn(&str) -> bool, IdShape); 2] = [
    (is_address_shaped, IdShape::Address),
    (is_hash_shaped, IdShape::Hash),
];

/// Probe order for address-shaped ids.
pub const ADDRESS_PROBES: [Category; 2] = [Category::Account, Category::Block];

/// Probe order for hash-shaped ids.
pub const HASH_PROBES: [Category; 3] = [
    Category::Transaction,
    Category::Activation,
    Category::Smesher,
];

pub fn classify_shape(id: &str) -> IdShape {
    SHAPE_RULES
        .iter()
        .find(|(matches, _)| matches(id))
        .map_or(IdShape::Other, |(_, shape)| *shape)
}

/// Candidate categories for a shape, in probe order.
pub fn probes_for(shape: IdShape) -> &'static [Category] {
    match shape {
        IdShape::Address => &ADDRESS_PROBES,
        IdShape::Hash => &HASH_PROBES,
        IdShape::Other => &[],
    }
}

/// Layer or epoch for a decimal id, given the synced watermark.
///
/// Numbers up to the current epoch are epochs (including the current epoch
/// number itself); larger numbers are layers if already synced.
pub fn classify_number(
    id: u32,
    watermark: LayerNumber,
    layers_per_epoch: u32,
) -> Option<Category> {
    let epoch: EpochNumber = watermark / layers_per_epoch.max(1);
    if id > epoch {
        (id <= watermark).then_some(Category::Layer)
    } else {
        Some(Category::Epoch)
    }
}
