//! Forced decisions
//!
//! Per-user overrides keyed by [`DecisionContext`]: a flag key plus an
//! optional rule key. A context without a rule key overrides the whole flag.
//! Overrides are only honored when the variation key is reachable from the
//! flag in the current configuration; anything else is ignored.

use crate::reasons::DecisionReasons;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vane_config::{Experiment, ProjectConfig, Variation};

/// Flag key and optional rule key an override applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub flag_key: String,
    pub rule_key: Option<String>,
}

impl DecisionContext {
    pub fn new(flag_key: impl Into<String>, rule_key: Option<String>) -> Self {
        Self {
            flag_key: flag_key.into(),
            rule_key,
        }
    }

    /// Override for the whole flag
    pub fn flag(flag_key: impl Into<String>) -> Self {
        Self::new(flag_key, None)
    }

    /// Override for one experiment or rollout rule of a flag
    pub fn rule(flag_key: impl Into<String>, rule_key: impl Into<String>) -> Self {
        Self::new(flag_key, Some(rule_key.into()))
    }

    fn describe(&self) -> String {
        match &self.rule_key {
            Some(rule) => format!("flag \"{}\", rule \"{rule}\"", self.flag_key),
            None => format!("flag \"{}\"", self.flag_key),
        }
    }
}

/// Desired variation for a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedDecision {
    pub variation_key: String,
}

impl ForcedDecision {
    pub fn new(variation_key: impl Into<String>) -> Self {
        Self {
            variation_key: variation_key.into(),
        }
    }
}

/// Thread-safe map of forced decisions for one user
#[derive(Debug, Default)]
pub struct ForcedDecisions {
    entries: RwLock<HashMap<DecisionContext, ForcedDecision>>,
}

impl ForcedDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the override for a context
    pub fn set(&self, context: DecisionContext, decision: ForcedDecision) {
        self.entries.write().insert(context, decision);
    }

    pub fn get(&self, context: &DecisionContext) -> Option<ForcedDecision> {
        self.entries.read().get(context).cloned()
    }

    pub fn contains(&self, context: &DecisionContext) -> bool {
        self.entries.read().contains_key(context)
    }

    /// Remove one override, returning whether it existed
    pub fn remove(&self, context: &DecisionContext) -> bool {
        self.entries.write().remove(context).is_some()
    }

    pub fn remove_all(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolve the override for `context` against the configuration.
    ///
    /// Returns the forced variation together with the experiment or rule that
    /// owns it. A variation key the flag cannot reach is discarded.
    pub fn resolve<'a>(
        &self,
        config: &'a ProjectConfig,
        context: &DecisionContext,
        user_id: &str,
        reasons: &mut DecisionReasons,
    ) -> Option<(&'a Experiment, &'a Variation)> {
        let forced = self.get(context)?;

        match config.flag_variation(&context.flag_key, &forced.variation_key) {
            Some(found) => {
                reasons.info(format!(
                    "Variation \"{}\" is forced for {} and user \"{user_id}\".",
                    forced.variation_key,
                    context.describe()
                ));
                Some(found)
            }
            None => {
                reasons.info(format!(
                    "Forced variation \"{}\" for {} and user \"{user_id}\" is not valid; ignoring it.",
                    forced.variation_key,
                    context.describe()
                ));
                None
            }
        }
    }
}

impl Clone for ForcedDecisions {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.entries.read().clone()),
        }
    }
}
