//! Records stored for a layer range, as read back for aggregation.

use shared_types::{Activation, LayerNumber, Reward, Transaction};

/// Everything stored for a range of layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeContents {
    /// Layer records present, ascending.
    pub layers: Vec<LayerNumber>,
    /// Transactions applied in the range.
    pub transactions: Vec<Transaction>,
    /// Activations received in the range.
    pub activations: Vec<Activation>,
    /// Rewards paid in the range.
    pub rewards: Vec<Reward>,
    /// Accounts whose `created_layer` falls in the range.
    pub accounts_created: u64,
}
