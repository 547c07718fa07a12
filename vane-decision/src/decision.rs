//! Decision results

use crate::error::DecisionError;
use serde::Serialize;
use serde_json::{Map, Value};
use vane_config::{Experiment, Flag, Variation};

/// Which stage of the waterfall produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSource {
    Experiment,
    Rollout,
    None,
}

impl DecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Experiment => "EXPERIMENT",
            Self::Rollout => "ROLLOUT",
            Self::None => "NONE",
        }
    }
}

/// Internal feature decision borrowing from the configuration
#[derive(Debug, Clone, Copy)]
pub struct FeatureDecision<'a> {
    pub experiment: Option<&'a Experiment>,
    pub variation: Option<&'a Variation>,
    pub source: DecisionSource,
}

impl<'a> FeatureDecision<'a> {
    pub fn new(experiment: &'a Experiment, variation: &'a Variation, source: DecisionSource) -> Self {
        Self {
            experiment: Some(experiment),
            variation: Some(variation),
            source,
        }
    }

    /// No variation; the flag is off for this user
    pub fn none() -> Self {
        Self {
            experiment: None,
            variation: None,
            source: DecisionSource::None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.variation.is_some_and(Variation::is_feature_enabled)
    }

    /// Typed variable values for `flag` under this decision
    pub fn variables(&self, flag: &Flag) -> Map<String, Value> {
        let variation = self.variation.filter(|v| v.is_feature_enabled());
        flag.variables
            .iter()
            .map(|variable| {
                let raw = variation
                    .and_then(|v| v.variable_value(&variable.id))
                    .unwrap_or(variable.default_value.as_str());
                let value = variable.decode(raw).unwrap_or_else(|| {
                    tracing::warn!(
                        flag_key = %flag.key,
                        variable = %variable.key,
                        raw = %raw,
                        "Variable value does not match its type"
                    );
                    Value::Null
                });
                (variable.key.clone(), value)
            })
            .collect()
    }
}

/// Decision returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Variation key, `None` when the user gets no variation
    pub variation_key: Option<String>,
    pub enabled: bool,
    pub variables: Map<String, Value>,
    /// Experiment or rollout rule that produced the decision
    pub rule_key: Option<String>,
    pub flag_key: String,
    pub source: DecisionSource,
    pub reasons: Vec<String>,
}

impl Decision {
    /// Decision carrying only an error reason
    pub fn error(flag_key: impl Into<String>, error: &DecisionError) -> Self {
        Self {
            variation_key: None,
            enabled: false,
            variables: Map::new(),
            rule_key: None,
            flag_key: flag_key.into(),
            source: DecisionSource::None,
            reasons: vec![error.to_string()],
        }
    }
}
