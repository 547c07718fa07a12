//! Project configuration for the Vane decision engine
//!
//! Loads a JSON datafile into an immutable, indexed [`ProjectConfig`]:
//! flags, experiments, mutual-exclusion groups, rollouts and audiences, with
//! audience expressions parsed once into [`ConditionTree`] values.
//!
//! ```
//! use vane_config::ProjectConfig;
//!
//! let config = ProjectConfig::from_json(r#"{"version": "4", "revision": "1"}"#).unwrap();
//! assert_eq!(config.revision(), "1");
//! ```

pub mod attributes;
pub mod condition;
pub mod entities;
pub mod error;
pub mod loader;
pub mod project;
pub mod validation;

pub use attributes::{AttributeValue, BUCKETING_ID_ATTRIBUTE, UserAttributes};
pub use condition::{ConditionTree, MatchType, UserCondition};
pub use entities::{
    Audience, Experiment, ExperimentStatus, Flag, Group, GroupPolicy, MAX_TRAFFIC_VALUE, Rollout,
    TrafficAllocation, Variable, VariableType, VariableUsage, Variation,
};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, SUPPORTED_VERSIONS};
pub use project::ProjectConfig;
pub use validation::{AllocationValidator, Validate};
