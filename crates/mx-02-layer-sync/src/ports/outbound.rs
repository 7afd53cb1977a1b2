//! # Outbound Ports (Driven Ports)
//!
//! Dependencies layer sync needs from the outside world.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Account, Activation, Block, LayerNumber, NetworkInfo, RewardRecord, Transaction, TxStatus,
};

use crate::domain::{LayerSnapshot, NodeError};

/// Read-only view of the node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Network constants (layers per epoch, genesis, address prefix).
    async fn network_info(&self) -> Result<NetworkInfo, NodeError>;

    /// Highest layer the node can serve.
    async fn highest_layer(&self) -> Result<LayerNumber, NodeError>;

    /// Everything in layer `number`.
    async fn layer(&self, number: LayerNumber) -> Result<LayerSnapshot, NodeError>;
}

/// Time source for backoff and polling sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock node serving scripted layers.
pub struct MockNode {
    /// Network constants returned by `network_info`.
    pub network: NetworkInfo,
    layers: RwLock<BTreeMap<LayerNumber, LayerSnapshot>>,
    /// Remaining failures per layer.
    failures: Mutex<HashMap<LayerNumber, u32>>,
    /// Should every call fail?
    should_fail: AtomicBool,
    layer_calls: AtomicU64,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new(NetworkInfo::for_testing())
    }
}

impl MockNode {
    pub fn new(network: NetworkInfo) -> Self {
        Self {
            network,
            layers: RwLock::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            should_fail: AtomicBool::new(false),
            layer_calls: AtomicU64::new(0),
        }
    }

    /// Node serving synthetic layers `0..=highest`.
    pub fn with_synthetic_layers(network: NetworkInfo, highest: LayerNumber) -> Self {
        let node = Self::new(network);
        for number in 0..=highest {
            node.push_layer(synthetic_layer(&node.network, number));
        }
        node
    }

    /// Serve (or replace) a layer.
    pub fn push_layer(&self, snapshot: LayerSnapshot) {
        self.layers.write().insert(snapshot.number(), snapshot);
    }

    /// Make the next `times` requests for `layer` fail as unavailable.
    pub fn fail_layer(&self, layer: LayerNumber, times: u32) {
        self.failures.lock().insert(layer, times);
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `layer` requests served or refused so far.
    pub fn layer_calls(&self) -> u64 {
        self.layer_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), NodeError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NodeError::Unavailable {
                endpoint: "mock".to_string(),
                message: "Mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn network_info(&self) -> Result<NetworkInfo, NodeError> {
        self.check()?;
        Ok(self.network.clone())
    }

    async fn highest_layer(&self) -> Result<LayerNumber, NodeError> {
        self.check()?;
        Ok(self.layers.read().keys().next_back().copied().unwrap_or(0))
    }

    async fn layer(&self, number: LayerNumber) -> Result<LayerSnapshot, NodeError> {
        self.layer_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(&number) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(NodeError::Unavailable {
                        endpoint: "mock".to_string(),
                        message: format!("scripted failure for layer {number}"),
                    });
                }
            }
        }

        self.layers
            .read()
            .get(&number)
            .cloned()
            .ok_or(NodeError::LayerNotAvailable { layer: number })
    }
}

/// Clock that records requested sleeps and returns immediately.
#[derive(Default)]
pub struct FakeClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Deterministic layer content for tests and local runs.
///
/// Layer `n` holds two blocks, two transactions, one activation from smesher
/// `n % 3`, that smesher's reward, and the touched account states. Ids are
/// 42 characters for blocks and accounts, 66 for transactions, activations
/// and smeshers.
pub fn synthetic_layer(network: &NetworkInfo, number: LayerNumber) -> LayerSnapshot {
    let n = u64::from(number);
    let address = |seed: u64| format!("{}1{:0>width$x}", network.hrp, seed, width = 41 - network.hrp.len());
    let hash = |domain: u128, seed: u64| format!("0x{:064x}", (domain << 96) | u128::from(seed));

    let smesher_seed = n % 3;
    let smesher_id = hash(0xa, smesher_seed);
    let coinbase = address(0xc0 + smesher_seed);
    let sender = address(0x100 + n % 5);
    let recipient = address(0x200 + n % 7);

    let transactions: Vec<Transaction> = (0..2u64)
        .map(|i| Transaction {
            id: hash(0x7, n * 2 + i),
            sender: sender.clone(),
            recipient: recipient.clone(),
            amount: 100 + i,
            fee: 1,
            layer: number,
            status: TxStatus::Applied,
        })
        .collect();

    let blocks: Vec<Block> = (0..2u64)
        .map(|i| Block {
            id: format!("0x{:040x}", (0xb_u128 << 72) | u128::from(n * 2 + i)),
            layer: number,
            tx_ids: vec![transactions[i as usize].id.clone()],
        })
        .collect();

    let activation = Activation {
        id: hash(0xe, n),
        smesher_id: smesher_id.clone(),
        coinbase: coinbase.clone(),
        layer: number,
        commitment_size: 1 << 30,
        timestamp: network.layer_start_time(number),
    };

    let reward = RewardRecord {
        smesher_id,
        coinbase: coinbase.clone(),
        layer: number,
        total: 1_000 + n,
        layer_reward: 1_000,
    };

    let accounts = [sender, recipient, coinbase]
        .into_iter()
        .map(|addr| Account {
            address: addr,
            balance: 10_000 + n,
            nonce: n,
            created_layer: number,
            layer_updated: number,
        })
        .collect();

    LayerSnapshot {
        layer: shared_types::Layer {
            number,
            blocks: blocks.iter().map(|b| b.id.clone()).collect(),
            timestamp: network.layer_start_time(number),
        },
        blocks,
        transactions,
        activations: vec![activation],
        rewards: vec![reward],
        accounts,
    }
}
