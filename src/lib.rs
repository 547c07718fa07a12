// Vane - client-embedded feature decisions for Rust
//
// This library decides which variation of a feature flag a user receives,
// locally and deterministically, from a configuration datafile.

// Re-export member crates
pub use vane_config;
pub use vane_decision;

// Re-export the main entry points
pub use vane_config::{AttributeValue, ConfigError, ProjectConfig, UserAttributes};
pub use vane_decision::{
    DecideOption, Decision, DecisionContext, DecisionEngine, DecisionEngineBuilder,
    DecisionError, DecisionSource, ForcedDecision, InMemoryStickyStore, StickyBucketStore,
    StoreError, StoredBucketing, UserContext,
};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AttributeValue,
        DecideOption,
        Decision,
        DecisionContext,
        DecisionEngine,
        DecisionSource,
        ForcedDecision,
        InMemoryStickyStore,
        ProjectConfig,
        StickyBucketStore,
        StoredBucketing,
        UserAttributes,
        UserContext,
    };
}
