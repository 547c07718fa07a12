//! User context: the decide APIs
//!
//! A [`UserContext`] binds a user id and attributes to an engine and owns the
//! user's forced decisions. Attribute and forced-decision updates take `&self`
//! so one context can be shared across threads.

use crate::decision::{Decision, FeatureDecision};
use crate::engine::DecisionEngine;
use crate::error::DecisionError;
use crate::forced::{DecisionContext, ForcedDecision, ForcedDecisions};
use crate::options::{DecideOption, ResolvedOptions};
use crate::reasons::DecisionReasons;
use crate::service::{DecisionRequest, DecisionService};
use parking_lot::RwLock;
use tracing::debug;
use vane_config::{AttributeValue, Flag, ProjectConfig, UserAttributes};

/// One user's view of the engine
pub struct UserContext {
    engine: DecisionEngine,
    user_id: String,
    attributes: RwLock<UserAttributes>,
    forced_decisions: ForcedDecisions,
}

impl UserContext {
    pub(crate) fn new(engine: DecisionEngine, user_id: String, attributes: UserAttributes) -> Self {
        Self {
            engine,
            user_id,
            attributes: RwLock::new(attributes),
            forced_decisions: ForcedDecisions::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Snapshot of the current attributes
    pub fn attributes(&self) -> UserAttributes {
        self.attributes.read().clone()
    }

    /// Set or replace one attribute
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.write().insert(name.into(), value.into());
    }

    /// Decide one flag.
    ///
    /// Never fails: a missing configuration or an unknown flag key comes back
    /// as a decision with no variation and the error as its only reason.
    pub fn decide(&self, flag_key: &str, options: &[DecideOption]) -> Decision {
        let Some(config) = self.engine.config() else {
            return Decision::error(flag_key, &DecisionError::NotReady);
        };
        let options = self.options(options);
        self.decide_keys(&config, &[flag_key], options)
            .into_iter()
            .next()
            .unwrap_or_else(|| {
                Decision::error(flag_key, &DecisionError::FlagNotFound(flag_key.to_string()))
            })
    }

    /// Decide several flags, in the order given.
    pub fn decide_for_keys<K: AsRef<str>>(
        &self,
        keys: &[K],
        options: &[DecideOption],
    ) -> Vec<Decision> {
        let Some(config) = self.engine.config() else {
            return keys
                .iter()
                .map(|key| Decision::error(key.as_ref(), &DecisionError::NotReady))
                .collect();
        };
        let options = self.options(options);
        let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let decisions = self.decide_keys(&config, &keys, options);
        Self::filter_enabled(decisions, options)
    }

    /// Decide every flag in the configuration, in datafile order.
    pub fn decide_all(&self, options: &[DecideOption]) -> Vec<Decision> {
        let Some(config) = self.engine.config() else {
            debug!(user_id = %self.user_id, "decide_all without configuration");
            return Vec::new();
        };
        let options = self.options(options);
        let decisions = self.resolve_flags(&config, config.flags(), options);
        Self::filter_enabled(decisions, options)
    }

    /// Force a variation for a flag or one of its rules
    pub fn set_forced_decision(&self, context: DecisionContext, decision: ForcedDecision) {
        self.forced_decisions.set(context, decision);
    }

    pub fn forced_decision(&self, context: &DecisionContext) -> Option<ForcedDecision> {
        self.forced_decisions.get(context)
    }

    /// Remove one forced decision, returning whether it existed
    pub fn remove_forced_decision(&self, context: &DecisionContext) -> bool {
        self.forced_decisions.remove(context)
    }

    pub fn remove_all_forced_decisions(&self) {
        self.forced_decisions.remove_all();
    }

    fn options(&self, options: &[DecideOption]) -> ResolvedOptions {
        ResolvedOptions::merge(self.engine.default_options(), options)
    }

    fn filter_enabled(decisions: Vec<Decision>, options: ResolvedOptions) -> Vec<Decision> {
        if !options.enabled_flags_only {
            return decisions;
        }
        decisions.into_iter().filter(|d| d.enabled).collect()
    }

    fn decide_keys(
        &self,
        config: &ProjectConfig,
        keys: &[&str],
        options: ResolvedOptions,
    ) -> Vec<Decision> {
        let flags: Vec<Option<&Flag>> = keys.iter().map(|key| config.flag(key)).collect();
        let mut resolved = self
            .resolve_flags(config, flags.iter().flatten().copied(), options)
            .into_iter();

        keys.iter()
            .zip(&flags)
            .filter_map(|(key, flag)| match flag {
                Some(_) => resolved.next(),
                None => Some(Decision::error(
                    *key,
                    &DecisionError::FlagNotFound(key.to_string()),
                )),
            })
            .collect()
    }

    /// Resolve flags sharing one sticky record load and one save.
    fn resolve_flags<'c>(
        &self,
        config: &'c ProjectConfig,
        flags: impl IntoIterator<Item = &'c Flag>,
        options: ResolvedOptions,
    ) -> Vec<Decision> {
        let attributes = self.attributes();
        let service = DecisionService::new(config);
        let mut sticky = self
            .engine
            .sticky_tracker(&self.user_id, options.ignore_sticky_bucketing);

        let mut shared = DecisionReasons::new();
        let request = DecisionRequest::new(&self.user_id, &attributes, &mut shared)
            .with_forced_decisions(&self.forced_decisions);

        let resolved: Vec<(&Flag, FeatureDecision<'_>, DecisionReasons)> = flags
            .into_iter()
            .map(|flag| {
                let mut reasons = shared.clone();
                let decision =
                    service.get_variation_for_feature(flag, &request, &mut sticky, &mut reasons);
                (flag, decision, reasons)
            })
            .collect();

        let mut save_reasons = DecisionReasons::new();
        sticky.flush(&mut save_reasons);

        resolved
            .into_iter()
            .map(|(flag, decision, mut reasons)| {
                reasons.append(save_reasons.clone());
                self.build_decision(flag, &decision, &reasons, options)
            })
            .collect()
    }

    fn build_decision(
        &self,
        flag: &Flag,
        decision: &FeatureDecision<'_>,
        reasons: &DecisionReasons,
        options: ResolvedOptions,
    ) -> Decision {
        let decision = Decision {
            variation_key: decision.variation.map(|v| v.key.clone()),
            enabled: decision.is_enabled(),
            variables: if options.exclude_variables {
                serde_json::Map::new()
            } else {
                decision.variables(flag)
            },
            rule_key: decision.experiment.map(|e| e.key.clone()),
            flag_key: flag.key.clone(),
            source: decision.source,
            reasons: reasons.report(options.include_reasons),
        };
        debug!(
            user_id = %self.user_id,
            flag_key = %decision.flag_key,
            variation = ?decision.variation_key,
            enabled = decision.enabled,
            source = decision.source.as_str(),
            "Flag decision"
        );
        decision
    }
}

impl Clone for UserContext {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            user_id: self.user_id.clone(),
            attributes: RwLock::new(self.attributes()),
            forced_decisions: self.forced_decisions.clone(),
        }
    }
}

impl std::fmt::Debug for UserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserContext")
            .field("user_id", &self.user_id)
            .field("attributes", &*self.attributes.read())
            .field("forced_decisions", &self.forced_decisions.len())
            .finish()
    }
}
