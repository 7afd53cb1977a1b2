//! Pipeline harness: MockNode → layer sync → entity store → resolver.

use std::sync::Arc;

use mx_01_entity_store::{
    DocumentBackend, EntityStore, EntityStoreService, InMemoryBackend, StoreConfig,
};
use mx_02_layer_sync::{
    FakeClock, GapScanner, LayerIngestor, MockNode, StatsRecalculator, SyncConfig, SyncEngine,
};
use mx_03_search::{IdentifierResolver, ResolveError};
use shared_types::{LayerNumber, NetworkInfo};

/// Every component wired over one store and one mock node.
pub struct Pipeline<B: DocumentBackend> {
    pub network: NetworkInfo,
    pub node: Arc<MockNode>,
    pub store: Arc<EntityStoreService<B>>,
    pub ingestor: Arc<LayerIngestor>,
    pub engine: Arc<SyncEngine>,
    pub scanner: Arc<GapScanner>,
    pub resolver: IdentifierResolver,
    pub clock: Arc<FakeClock>,
}

impl Pipeline<InMemoryBackend> {
    /// In-memory pipeline over a node serving layers `0..=highest`.
    pub fn in_memory(highest: LayerNumber, config: SyncConfig) -> Self {
        let network = NetworkInfo::for_testing();
        let node = Arc::new(MockNode::with_synthetic_layers(network.clone(), highest));
        let store = Arc::new(EntityStoreService::in_memory(StoreConfig::for_testing()));
        Self::new(store, node, config)
    }
}

impl<B: DocumentBackend> Pipeline<B> {
    pub fn new(store: Arc<EntityStoreService<B>>, node: Arc<MockNode>, config: SyncConfig) -> Self {
        let network = node.network.clone();
        let ingestor = Arc::new(LayerIngestor::new(
            node.clone(),
            store.clone(),
            config.atx_sync,
        ));
        let stats = Arc::new(StatsRecalculator::new(store.clone(), network.clone()));
        let engine = Arc::new(SyncEngine::new(
            ingestor.clone(),
            stats.clone(),
            network.clone(),
            config.clone(),
        ));
        let clock = Arc::new(FakeClock::new());
        let scanner = Arc::new(GapScanner::new(ingestor.clone(), stats, clock.clone(), config));
        let resolver = IdentifierResolver::new(store.clone(), network.clone());

        Self {
            network,
            node,
            store,
            ingestor,
            engine,
            scanner,
            resolver,
            clock,
        }
    }

    /// Advance until caught up with the node. Returns layers applied.
    pub async fn sync_to_tip(&self) -> u32 {
        let mut total = 0;
        loop {
            match self.engine.advance().await {
                Ok(0) => return total,
                Ok(applied) => total += applied,
                Err(e) => panic!("sync failed: {e}"),
            }
        }
    }

    pub async fn watermark(&self) -> Option<LayerNumber> {
        match self.store.sync_state().await {
            Ok(state) => state.watermark,
            Err(e) => panic!("sync state unreadable: {e}"),
        }
    }

    /// Redirect path for `id`, `None` when not found.
    pub async fn redirect(&self, id: &str) -> Option<String> {
        match self.resolver.resolve(id).await {
            Ok(target) => Some(target.redirect_path()),
            Err(ResolveError::NotFound) => None,
            Err(e) => panic!("search failed for {id}: {e}"),
        }
    }
}
