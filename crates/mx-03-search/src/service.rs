//! # Identifier Resolver
//!
//! Read-only: probes the entity store, never writes.

use std::sync::Arc;

use mx_01_entity_store::EntityStore;
use shared_types::{NetworkInfo, ObjectId};
use tracing::debug;

use crate::domain::{
    classify_number, classify_shape, probes_for, Category, IdShape, ResolveError, SearchTarget,
};

pub struct IdentifierResolver {
    store: Arc<dyn EntityStore>,
    network: NetworkInfo,
}

impl IdentifierResolver {
    pub fn new(store: Arc<dyn EntityStore>, network: NetworkInfo) -> Self {
        Self { store, network }
    }

    /// Resolve an opaque identifier to its canonical target.
    pub async fn resolve(&self, id: &str) -> Result<SearchTarget, ResolveError> {
        let shape = classify_shape(id);
        let target = match shape {
            IdShape::Address | IdShape::Hash => self.probe(probes_for(shape), id).await?,
            IdShape::Other => self.resolve_other(id).await?,
        };

        match &target {
            Some(target) => debug!(id, path = %target.redirect_path(), "[mx-03] resolved"),
            None => debug!(id, ?shape, "[mx-03] not found"),
        }
        target.ok_or(ResolveError::NotFound)
    }

    async fn probe(
        &self,
        categories: &[Category],
        id: &str,
    ) -> Result<Option<SearchTarget>, ResolveError> {
        for category in categories {
            let Some(collection) = category.collection() else {
                continue;
            };
            if self.store.exists(collection, id).await? {
                return Ok(Some(SearchTarget::new(*category, id)));
            }
        }
        Ok(None)
    }

    async fn resolve_other(&self, id: &str) -> Result<Option<SearchTarget>, ResolveError> {
        if let Ok(object_id) = ObjectId::parse_hex(id) {
            if self.store.reward_exists(&object_id).await? {
                return Ok(Some(SearchTarget::new(Category::Reward, object_id.to_hex())));
            }
        }

        let Ok(number) = id.parse::<u32>() else {
            return Ok(None);
        };
        let watermark = self.store.sync_state().await?.watermark_or_zero();

        Ok(
            classify_number(number, watermark, self.network.layers_per_epoch)
                .map(|category| SearchTarget::new(category, number.to_string())),
        )
    }
}
