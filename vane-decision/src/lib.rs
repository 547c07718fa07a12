//! Feature decisions for Vane
//!
//! Deterministic, client-side flag decisions over a [`vane_config::ProjectConfig`]
//! snapshot: experiment bucketing, audience targeting, rollouts, sticky
//! bucketing and forced decisions.
//!
//! # Features
//!
//! - **Bucketing** - MurmurHash3 traffic allocation, stable across platforms
//! - **Audiences** - Three-valued condition trees with exact, substring,
//!   numeric, existence and semantic-version matchers
//! - **Mutual exclusion** - Group-level allocation between experiments
//! - **Rollouts** - Ordered targeting rules with an "everyone else" catch-all
//! - **Sticky bucketing** - Optional pluggable store that pins assignments
//! - **Forced decisions** - Per-user overrides for a flag or one of its rules
//!
//! # Quick Start
//!
//! ```
//! use vane_config::{ProjectConfig, UserAttributes};
//! use vane_decision::DecisionEngine;
//!
//! let config = ProjectConfig::from_json(r#"{
//!     "version": "4",
//!     "rollouts": [{"id": "r1", "experiments": [{
//!         "id": "rule1", "key": "everyone", "status": "Running",
//!         "variations": [{"id": "on", "key": "on", "featureEnabled": true}],
//!         "trafficAllocation": [{"entityId": "on", "endOfRange": 10000}]
//!     }]}],
//!     "featureFlags": [{"id": "f1", "key": "new_checkout", "experimentIds": [], "rolloutId": "r1"}]
//! }"#).unwrap();
//!
//! let engine = DecisionEngine::new(config);
//! let user = engine.create_user_context("user-123", UserAttributes::new());
//! let decision = user.decide("new_checkout", &[]);
//!
//! assert!(decision.enabled);
//! assert_eq!(decision.variation_key.as_deref(), Some("on"));
//! ```
//!
//! # Sticky Bucketing
//!
//! ```
//! use std::sync::Arc;
//! use vane_config::ProjectConfig;
//! use vane_decision::{DecisionEngine, InMemoryStickyStore};
//!
//! let engine = DecisionEngine::builder()
//!     .config(ProjectConfig::default())
//!     .sticky_store(Arc::new(InMemoryStickyStore::new()))
//!     .build();
//! assert!(engine.has_sticky_store());
//! ```
//!
//! # Forced Decisions
//!
//! ```
//! use vane_config::{ProjectConfig, UserAttributes};
//! use vane_decision::{DecisionContext, DecisionEngine, ForcedDecision};
//!
//! let engine = DecisionEngine::new(ProjectConfig::default());
//! let user = engine.create_user_context("qa-user", UserAttributes::new());
//! user.set_forced_decision(
//!     DecisionContext::rule("new_checkout", "beta_rule"),
//!     ForcedDecision::new("treatment"),
//! );
//! ```

pub mod audience;
pub mod bucketer;
pub mod condition;
pub mod decision;
pub mod engine;
pub mod error;
pub mod forced;
pub mod matcher;
pub mod options;
pub mod reasons;
pub mod semver;
pub mod service;
pub mod stores;
pub mod user;

pub use audience::meets_audience_conditions;
pub use bucketer::{HASH_SEED, MAX_HASH_VALUE, MAX_TRAFFIC_VALUE, generate_bucket_value};
pub use condition::Tristate;
pub use decision::{Decision, DecisionSource, FeatureDecision};
pub use engine::{DecisionEngine, DecisionEngineBuilder};
pub use error::{DecisionError, DecisionResult, StoreError, StoreResult};
pub use forced::{DecisionContext, ForcedDecision, ForcedDecisions};
pub use options::DecideOption;
pub use reasons::DecisionReasons;
pub use semver::SemanticVersion;
pub use service::{DecisionRequest, DecisionService};
pub use stores::{InMemoryStickyStore, StickyBucketStore, StickyTracker, StoredBucketing};
pub use user::UserContext;
