//! Network-wide constants reported by the node.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{EpochNumber, LayerNumber};
use crate::layer_range::LayerRange;

/// Address HRP on mainnet.
pub const MAINNET_HRP: &str = "sm";

/// Address HRP on testnets.
pub const TESTNET_HRP: &str = "stest";

/// Returns the address HRP for the given network flavour.
pub fn hrp_for(testnet: bool) -> &'static str {
    if testnet {
        TESTNET_HRP
    } else {
        MAINNET_HRP
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkInfoError {
    #[error("layers_per_epoch must be greater than zero")]
    ZeroLayersPerEpoch,

    #[error("address hrp is empty")]
    EmptyHrp,
}

/// Layer clock and address format of the indexed network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Layers in one epoch. Always > 0 once validated.
    pub layers_per_epoch: u32,
    /// Unix timestamp of layer 0.
    pub genesis_time: u64,
    /// Duration of one layer in seconds.
    pub layer_duration_secs: u64,
    /// Human readable prefix of account addresses.
    pub hrp: String,
}

impl NetworkInfo {
    pub fn validate(&self) -> Result<(), NetworkInfoError> {
        if self.layers_per_epoch == 0 {
            return Err(NetworkInfoError::ZeroLayersPerEpoch);
        }
        if self.hrp.is_empty() {
            return Err(NetworkInfoError::EmptyHrp);
        }
        Ok(())
    }

    /// Epoch a layer belongs to.
    pub fn epoch_of(&self, layer: LayerNumber) -> EpochNumber {
        layer / self.layers_per_epoch.max(1)
    }

    /// Layers making up an epoch, clamped at `u32::MAX`.
    pub fn epoch_range(&self, epoch: EpochNumber) -> LayerRange {
        let per = u64::from(self.layers_per_epoch.max(1));
        let first = u64::from(epoch) * per;
        let last = first + per - 1;
        let clamp = |v: u64| v.min(u64::from(LayerNumber::MAX)) as LayerNumber;
        LayerRange::new(clamp(first), clamp(last))
    }

    /// True when `layer` opens an epoch (and is not layer 0).
    pub fn is_first_layer_of_epoch(&self, layer: LayerNumber) -> bool {
        layer > 0 && layer % self.layers_per_epoch.max(1) == 0
    }

    /// Unix timestamp at which a layer starts.
    pub fn layer_start_time(&self, layer: LayerNumber) -> u64 {
        self.genesis_time + u64::from(layer) * self.layer_duration_secs
    }

    /// True when `address` carries this network's prefix.
    pub fn address_matches_hrp(&self, address: &str) -> bool {
        address
            .strip_prefix(self.hrp.as_str())
            .is_some_and(|rest| rest.starts_with('1'))
    }

    pub fn for_testing() -> Self {
        Self {
            layers_per_epoch: 10,
            genesis_time: 1_700_000_000,
            layer_duration_secs: 300,
            hrp: MAINNET_HRP.to_string(),
        }
    }
}
