use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::domain::{Collection, StoreError};
use crate::ports::outbound::{BatchOperation, DocumentBackend, ScanResult};

type Namespace = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory backend for unit tests and dry runs.
///
/// Batches are applied under a single write lock, so they are atomic with
/// respect to readers. Write failures and latency can be injected.
#[derive(Default)]
pub struct InMemoryBackend {
    data: RwLock<HashMap<Collection, Namespace>>,
    /// Remaining batches allowed before writes start failing. `None` = unlimited.
    write_budget: Mutex<Option<usize>>,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        *self.write_budget.lock() = if fail { Some(0) } else { None };
    }

    /// Allow `batches` more write batches, then fail every write.
    pub fn fail_writes_after(&self, batches: usize) {
        *self.write_budget.lock() = Some(batches);
    }

    /// Sleep this long inside every call.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Number of keys stored in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.data.read().get(&collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().values().all(BTreeMap::is_empty)
    }

    /// Full copy of the stored data, for comparing store states in tests.
    pub fn snapshot(&self) -> HashMap<Collection, Namespace> {
        self.data
            .read()
            .iter()
            .filter(|(_, ns)| !ns.is_empty())
            .map(|(c, ns)| (*c, ns.clone()))
            .collect()
    }

    fn simulate_latency(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
    }
}

impl DocumentBackend for InMemoryBackend {
    fn get(&self, collection: Collection, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.simulate_latency();
        Ok(self
            .data
            .read()
            .get(&collection)
            .and_then(|ns| ns.get(key).cloned()))
    }

    fn scan(
        &self,
        collection: Collection,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Result<ScanResult, StoreError> {
        self.simulate_latency();
        let data = self.data.read();
        let Some(ns) = data.get(&collection) else {
            return Ok(Vec::new());
        };
        let upper = match end {
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        Ok(ns
            .range((Bound::Included(start.to_vec()), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        self.simulate_latency();
        {
            let mut budget = self.write_budget.lock();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    let collection = operations
                        .first()
                        .map_or("unknown", |op| op.collection().name());
                    return Err(StoreError::backend(collection, "injected write failure"));
                }
                *remaining -= 1;
            }
        }

        let mut data = self.data.write();
        for op in operations {
            match op {
                BatchOperation::Put {
                    collection,
                    key,
                    value,
                } => {
                    data.entry(collection).or_default().insert(key, value);
                }
                BatchOperation::Delete { collection, key } => {
                    if let Some(ns) = data.get_mut(&collection) {
                        ns.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
