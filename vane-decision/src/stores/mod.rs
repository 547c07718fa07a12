//! Sticky bucketing storage
//!
//! A sticky bucketing store remembers which variation a user was bucketed
//! into per experiment, so later decisions return the same variation even
//! after traffic allocation changes. The store is optional and pluggable:
//!
//! - **Memory**: In-memory storage using DashMap (single process, tests)
//! - Anything else implementing [`StickyBucketStore`]
//!
//! Store failures never fail a decision. A failed lookup is a cache miss and
//! a failed save is dropped with an error reason.

mod memory;

pub use memory::InMemoryStickyStore;

use crate::error::StoreResult;
use crate::reasons::DecisionReasons;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Stored assignments for one user: experiment id to variation id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBucketing {
    pub user_id: String,
    pub experiment_bucket_map: HashMap<String, String>,
}

impl StoredBucketing {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            experiment_bucket_map: HashMap::new(),
        }
    }

    /// Stored variation id for an experiment
    pub fn variation_id(&self, experiment_id: &str) -> Option<&str> {
        self.experiment_bucket_map
            .get(experiment_id)
            .map(String::as_str)
    }

    /// Record an assignment, returning whether the record changed
    pub fn assign(&mut self, experiment_id: &str, variation_id: &str) -> bool {
        if self.variation_id(experiment_id) == Some(variation_id) {
            return false;
        }
        self.experiment_bucket_map
            .insert(experiment_id.to_string(), variation_id.to_string());
        true
    }
}

/// Trait for sticky bucketing storage backends
///
/// Calls are synchronous and made at most once each per decision call.
pub trait StickyBucketStore: Send + Sync {
    /// Load the stored record for a user; `Ok(None)` when there is none
    fn lookup(&self, user_id: &str) -> StoreResult<Option<StoredBucketing>>;

    /// Persist a user's record, replacing any previous one
    fn save(&self, record: &StoredBucketing) -> StoreResult<()>;

    /// Get store type name for debugging
    fn store_type(&self) -> &'static str {
        "custom"
    }
}

/// Per-call view of a user's sticky record
///
/// Loads the record lazily on first use, collects new assignments and writes
/// the record back once in [`StickyTracker::flush`] if anything changed.
pub struct StickyTracker<'s> {
    store: Option<&'s dyn StickyBucketStore>,
    user_id: String,
    record: Option<StoredBucketing>,
    dirty: bool,
}

impl<'s> StickyTracker<'s> {
    pub fn new(store: Option<&'s dyn StickyBucketStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            record: None,
            dirty: false,
        }
    }

    /// A tracker that never touches a store
    pub fn disabled() -> Self {
        Self::new(None, String::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    fn record(&mut self, reasons: &mut DecisionReasons) -> Option<&mut StoredBucketing> {
        let store = self.store?;
        if self.record.is_none() {
            let loaded = match store.lookup(&self.user_id) {
                Ok(Some(record)) => record,
                Ok(None) => StoredBucketing::new(self.user_id.clone()),
                Err(err) => {
                    reasons.error(format!(
                        "Unable to look up sticky bucketing record for user \"{}\": {err}",
                        self.user_id
                    ));
                    StoredBucketing::new(self.user_id.clone())
                }
            };
            trace!(
                user_id = %self.user_id,
                store = store.store_type(),
                entries = loaded.experiment_bucket_map.len(),
                "Loaded sticky bucketing record"
            );
            self.record = Some(loaded);
        }
        self.record.as_mut()
    }

    /// Previously stored variation id for an experiment
    pub fn recall(&mut self, experiment_id: &str, reasons: &mut DecisionReasons) -> Option<String> {
        self.record(reasons)?
            .variation_id(experiment_id)
            .map(str::to_string)
    }

    /// Remember a fresh assignment; written on flush
    pub fn remember(&mut self, experiment_id: &str, variation_id: &str, reasons: &mut DecisionReasons) {
        if let Some(record) = self.record(reasons) {
            if record.assign(experiment_id, variation_id) {
                self.dirty = true;
            }
        }
    }

    /// Save the record if any assignment changed it
    pub fn flush(self, reasons: &mut DecisionReasons) {
        let (Some(store), Some(record)) = (self.store, self.record) else {
            return;
        };
        if !self.dirty {
            return;
        }
        match store.save(&record) {
            Ok(()) => reasons.info(format!(
                "Saved sticky bucketing record for user \"{}\".",
                record.user_id
            )),
            Err(err) => reasons.error(format!(
                "Unable to save sticky bucketing record for user \"{}\": {err}",
                record.user_id
            )),
        }
    }
}
