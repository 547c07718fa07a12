//! Configuration entities
//!
//! Flags, experiments, variations, groups, rollouts and audiences as they
//! appear in a datafile. Entities are immutable once a [`ProjectConfig`] has
//! been built.
//!
//! [`ProjectConfig`]: crate::ProjectConfig

use crate::condition::{self, ConditionTree, UserCondition};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Upper bound of every traffic allocation table.
pub const MAX_TRAFFIC_VALUE: u32 = 10_000;

/// One slot of a traffic allocation table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficAllocation {
    /// Variation id (experiments) or experiment id (groups); empty means no slot
    pub entity_id: String,

    /// Exclusive cumulative range end
    pub end_of_range: u32,
}

impl TrafficAllocation {
    pub fn new(entity_id: impl Into<String>, end_of_range: u32) -> Self {
        Self {
            entity_id: entity_id.into(),
            end_of_range,
        }
    }
}

/// Experiment lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ExperimentStatus {
    Running,
    #[default]
    Paused,
    NotStarted,
    Archived,
    Launched,
    Other(String),
}

impl From<String> for ExperimentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Running" => Self::Running,
            "Paused" => Self::Paused,
            "Not started" => Self::NotStarted,
            "Archived" => Self::Archived,
            "Launched" => Self::Launched,
            _ => Self::Other(value),
        }
    }
}

/// Experiment variation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: String,

    pub key: String,

    /// `None` for pure A/B experiments that do not gate a flag
    #[serde(default)]
    pub feature_enabled: Option<bool>,

    /// Variable overrides, keyed by variable id
    #[serde(default)]
    pub variables: Vec<VariableUsage>,
}

impl Variation {
    /// Whether this variation turns its flag on.
    pub fn is_feature_enabled(&self) -> bool {
        self.feature_enabled.unwrap_or(false)
    }

    /// String-encoded override for a variable id.
    pub fn variable_value(&self, variable_id: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|usage| usage.id == variable_id)
            .map(|usage| usage.value.as_str())
    }
}

/// Variable override carried by a variation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariableUsage {
    pub id: String,
    pub value: String,
}

/// A/B test or rollout rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,

    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub status: ExperimentStatus,

    #[serde(default)]
    pub layer_id: String,

    #[serde(default)]
    pub variations: Vec<Variation>,

    #[serde(default)]
    pub traffic_allocation: Vec<TrafficAllocation>,

    /// Legacy flat audience list, combined with `or`
    #[serde(default)]
    pub audience_ids: Vec<String>,

    /// Structured audience expression; preferred over `audience_ids`
    #[serde(default, deserialize_with = "condition::deserialize_audience_refs")]
    pub audience_conditions: Option<ConditionTree<String>>,

    /// Legacy whitelist: user id to variation key
    #[serde(default)]
    pub forced_variations: HashMap<String, String>,

    /// Mutual-exclusion group, assigned while loading
    #[serde(default)]
    pub group_id: Option<String>,
}

impl Experiment {
    pub fn is_running(&self) -> bool {
        self.status == ExperimentStatus::Running
    }

    pub fn variation_by_id(&self, id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    pub fn variation_by_key(&self, key: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.key == key)
    }

    /// Audience expression to evaluate, if any.
    ///
    /// The structured tree wins; otherwise the legacy id list becomes an
    /// implicit `or`.
    pub fn audience_tree(&self) -> Option<Cow<'_, ConditionTree<String>>> {
        match &self.audience_conditions {
            Some(tree) => Some(Cow::Borrowed(tree)),
            None if self.audience_ids.is_empty() => None,
            None => Some(Cow::Owned(ConditionTree::any_of(
                self.audience_ids.iter().cloned(),
            ))),
        }
    }
}

/// Group traffic policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum GroupPolicy {
    /// Mutually exclusive: the group allocation picks one member
    #[default]
    Random,
    /// Members bucket independently
    Overlapping,
}

impl From<String> for GroupPolicy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "overlapping" => Self::Overlapping,
            _ => Self::Random,
        }
    }
}

/// Mutual-exclusion group
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub id: String,
    pub policy: GroupPolicy,
    /// Ids of member experiments
    pub experiment_ids: Vec<String>,
    pub traffic_allocation: Vec<TrafficAllocation>,
}

impl Group {
    pub fn is_mutually_exclusive(&self) -> bool {
        self.policy == GroupPolicy::Random
    }
}

/// Ordered targeting rules; the last one is the catch-all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rollout {
    pub id: String,

    #[serde(default, rename = "experiments")]
    pub rules: Vec<Experiment>,
}

/// Named, reusable attribute expression.
#[derive(Debug, Clone, Deserialize)]
pub struct Audience {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(deserialize_with = "condition::deserialize_user_conditions")]
    pub conditions: ConditionTree<UserCondition>,
}

/// Variable value type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum VariableType {
    String,
    Integer,
    Double,
    Boolean,
    Json,
    Other(String),
}

impl From<String> for VariableType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "json" => Self::Json,
            _ => Self::Other(value),
        }
    }
}

/// Flag variable definition
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: String,

    pub key: String,

    #[serde(rename = "type")]
    pub kind: VariableType,

    #[serde(default)]
    pub default_value: String,

    /// Older datafiles encode json as `string` with `subType: json`
    #[serde(default)]
    pub sub_type: Option<String>,
}

impl Variable {
    pub fn value_type(&self) -> VariableType {
        match (&self.kind, self.sub_type.as_deref()) {
            (VariableType::String, Some("json")) => VariableType::Json,
            (kind, _) => kind.clone(),
        }
    }

    /// Decode a string-encoded value according to the variable type.
    pub fn decode(&self, raw: &str) -> Option<Value> {
        match self.value_type() {
            VariableType::String | VariableType::Other(_) => Some(Value::String(raw.to_string())),
            VariableType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            VariableType::Double => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            VariableType::Boolean => raw.trim().parse::<bool>().ok().map(Value::Bool),
            VariableType::Json => serde_json::from_str(raw).ok(),
        }
    }
}

/// Feature flag
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: String,

    pub key: String,

    #[serde(default)]
    pub experiment_ids: Vec<String>,

    #[serde(default)]
    pub rollout_id: Option<String>,

    #[serde(default)]
    pub variables: Vec<Variable>,
}
