//! In-memory sticky bucketing store
//!
//! Uses DashMap for thread-safe concurrent access. Suitable for a single
//! process or for testing; records are lost when the store is dropped.

use crate::error::StoreResult;
use crate::stores::{StickyBucketStore, StoredBucketing};
use dashmap::DashMap;
use tracing::{debug, trace};

/// In-memory sticky bucketing store
pub struct InMemoryStickyStore {
    records: DashMap<String, StoredBucketing>,
}

impl InMemoryStickyStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        debug!("Creating new in-memory sticky bucketing store");
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of users with a stored record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop a user's record
    pub fn remove(&self, user_id: &str) -> Option<StoredBucketing> {
        self.records.remove(user_id).map(|(_, record)| record)
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}

impl Default for InMemoryStickyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStickyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStickyStore")
            .field("records", &self.records.len())
            .finish()
    }
}

impl StickyBucketStore for InMemoryStickyStore {
    fn lookup(&self, user_id: &str) -> StoreResult<Option<StoredBucketing>> {
        trace!(user_id = %user_id, "Sticky bucketing lookup");
        Ok(self.records.get(user_id).map(|entry| entry.value().clone()))
    }

    fn save(&self, record: &StoredBucketing) -> StoreResult<()> {
        trace!(
            user_id = %record.user_id,
            entries = record.experiment_bucket_map.len(),
            "Sticky bucketing save"
        );
        self.records.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}
