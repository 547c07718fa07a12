//! Decision service
//!
//! Resolves experiments, rollouts and flags for one user against one
//! configuration snapshot. Precedence, highest first:
//!
//! 1. forced decisions (an exact rule-level match beats a flag-level one;
//!    without a flag-level override, rule-level ones apply as the waterfall
//!    reaches each rule)
//! 2. the experiment's legacy whitelist
//! 3. a sticky bucketing record
//! 4. audience targeting followed by traffic bucketing
//!
//! Nothing here fails: every dead end is "no variation" plus a reason.

use crate::audience::meets_audience_conditions;
use crate::bucketer;
use crate::decision::{DecisionSource, FeatureDecision};
use crate::forced::{DecisionContext, ForcedDecisions};
use crate::reasons::DecisionReasons;
use crate::stores::StickyTracker;
use vane_config::{
    AttributeValue, BUCKETING_ID_ATTRIBUTE, Experiment, Flag, ProjectConfig, UserAttributes,
    Variation,
};

/// The user side of a decision
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'r> {
    pub user_id: &'r str,
    pub attributes: &'r UserAttributes,
    /// Id fed to the hash; the user id unless `$opt_bucketing_id` is set
    pub bucketing_id: &'r str,
    pub forced_decisions: Option<&'r ForcedDecisions>,
}

impl<'r> DecisionRequest<'r> {
    pub fn new(
        user_id: &'r str,
        attributes: &'r UserAttributes,
        reasons: &mut DecisionReasons,
    ) -> Self {
        Self {
            user_id,
            attributes,
            bucketing_id: bucketing_id(user_id, attributes, reasons),
            forced_decisions: None,
        }
    }

    pub fn with_forced_decisions(mut self, forced: &'r ForcedDecisions) -> Self {
        self.forced_decisions = Some(forced);
        self
    }
}

/// Id used for bucketing: a string `$opt_bucketing_id` attribute, else the
/// user id.
pub fn bucketing_id<'r>(
    user_id: &'r str,
    attributes: &'r UserAttributes,
    reasons: &mut DecisionReasons,
) -> &'r str {
    match attributes.get(BUCKETING_ID_ATTRIBUTE) {
        None | Some(AttributeValue::Null) => user_id,
        Some(AttributeValue::String(id)) => id.as_str(),
        Some(other) => {
            reasons.error(format!(
                "Bucketing ID attribute is a {}, not a string; using user id \"{user_id}\".",
                other.type_name()
            ));
            user_id
        }
    }
}

/// Resolves decisions over a borrowed configuration
#[derive(Debug, Clone, Copy)]
pub struct DecisionService<'a> {
    config: &'a ProjectConfig,
}

impl<'a> DecisionService<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a ProjectConfig {
        self.config
    }

    /// Resolve one experiment for a user.
    pub fn get_variation(
        &self,
        experiment: &'a Experiment,
        request: &DecisionRequest<'_>,
        sticky: &mut StickyTracker<'_>,
        reasons: &mut DecisionReasons,
    ) -> Option<&'a Variation> {
        let user_id = request.user_id;

        if !experiment.is_running() {
            reasons.info(format!(
                "Experiment \"{}\" is not running.",
                experiment.key
            ));
            return None;
        }

        if let Some(variation) = self.whitelisted_variation(experiment, user_id, reasons) {
            return Some(variation);
        }

        if let Some(variation_id) = sticky.recall(&experiment.id, reasons) {
            match experiment.variation_by_id(&variation_id) {
                Some(variation) => {
                    reasons.info(format!(
                        "Returning previously stored variation \"{}\" of experiment \"{}\" for user \"{user_id}\".",
                        variation.key, experiment.key
                    ));
                    return Some(variation);
                }
                None => reasons.info(format!(
                    "Stored variation id \"{variation_id}\" is no longer in experiment \"{}\"; bucketing user \"{user_id}\" again.",
                    experiment.key
                )),
            }
        }

        if !meets_audience_conditions(self.config, experiment, request.attributes, reasons) {
            reasons.info(format!(
                "User \"{user_id}\" does not meet conditions to be in experiment \"{}\".",
                experiment.key
            ));
            return None;
        }

        let variation = bucketer::bucket(
            self.config,
            experiment,
            request.bucketing_id,
            user_id,
            reasons,
        )?;
        sticky.remember(&experiment.id, &variation.id, reasons);
        Some(variation)
    }

    fn whitelisted_variation(
        &self,
        experiment: &'a Experiment,
        user_id: &str,
        reasons: &mut DecisionReasons,
    ) -> Option<&'a Variation> {
        let variation_key = experiment.forced_variations.get(user_id)?;
        match experiment.variation_by_key(variation_key) {
            Some(variation) => {
                reasons.info(format!(
                    "User \"{user_id}\" is forced in variation \"{variation_key}\" of experiment \"{}\".",
                    experiment.key
                ));
                Some(variation)
            }
            None => {
                reasons.error(format!(
                    "Whitelisted variation \"{variation_key}\" for user \"{user_id}\" is not in experiment \"{}\".",
                    experiment.key
                ));
                None
            }
        }
    }

    /// Flag-level forced decision, tagged with the stage that owns the
    /// forced variation.
    pub fn forced_flag_decision(
        &self,
        flag: &'a Flag,
        request: &DecisionRequest<'_>,
        reasons: &mut DecisionReasons,
    ) -> Option<FeatureDecision<'a>> {
        let forced = request.forced_decisions.filter(|f| !f.is_empty())?;
        let context = DecisionContext::flag(&flag.key);
        let (rule, variation) = forced.resolve(self.config, &context, request.user_id, reasons)?;

        let source = if flag.experiment_ids.contains(&rule.id) {
            DecisionSource::Experiment
        } else {
            DecisionSource::Rollout
        };
        Some(FeatureDecision::new(rule, variation, source))
    }

    /// First valid exact (flag, rule) override, in waterfall order.
    fn forced_rule_decision(
        &self,
        flag: &'a Flag,
        request: &DecisionRequest<'_>,
        reasons: &mut DecisionReasons,
    ) -> Option<FeatureDecision<'a>> {
        for experiment in self.config.flag_experiments(flag) {
            if let Some(variation) = self.forced_rule_variation(flag, experiment, request, reasons) {
                return Some(FeatureDecision::new(experiment, variation, DecisionSource::Experiment));
            }
        }
        let rollout = self.config.flag_rollout(flag)?;
        rollout.rules.iter().find_map(|rule| {
            self.forced_rule_variation(flag, rule, request, reasons)
                .map(|variation| FeatureDecision::new(rule, variation, DecisionSource::Rollout))
        })
    }

    fn forced_rule_variation(
        &self,
        flag: &Flag,
        rule: &Experiment,
        request: &DecisionRequest<'_>,
        reasons: &mut DecisionReasons,
    ) -> Option<&'a Variation> {
        let forced = request.forced_decisions.filter(|f| !f.is_empty())?;
        let context = DecisionContext::rule(&flag.key, &rule.key);
        forced
            .resolve(self.config, &context, request.user_id, reasons)
            .map(|(_, variation)| variation)
    }

    /// Walk a flag's rollout rules in order.
    ///
    /// Rules before the last fall through to the next rule on an audience
    /// miss or a traffic miss. The last rule is the catch-all; missing it
    /// means no rollout decision.
    pub fn get_variation_for_rollout(
        &self,
        flag: &'a Flag,
        request: &DecisionRequest<'_>,
        reasons: &mut DecisionReasons,
    ) -> FeatureDecision<'a> {
        let user_id = request.user_id;

        let Some(rollout_id) = flag.rollout_id.as_deref() else {
            reasons.info(format!("Flag \"{}\" has no rollout.", flag.key));
            return FeatureDecision::none();
        };
        let Some(rollout) = self.config.rollout(rollout_id) else {
            reasons.error(format!(
                "Rollout \"{rollout_id}\" of flag \"{}\" is not in the datafile.",
                flag.key
            ));
            return FeatureDecision::none();
        };
        let Some(last) = rollout.rules.len().checked_sub(1) else {
            reasons.info(format!("Rollout \"{rollout_id}\" has no rules."));
            return FeatureDecision::none();
        };

        for (index, rule) in rollout.rules.iter().enumerate() {
            let label = if index == last {
                "Everyone Else".to_string()
            } else {
                (index + 1).to_string()
            };

            if let Some(variation) = self.forced_rule_variation(flag, rule, request, reasons) {
                return FeatureDecision::new(rule, variation, DecisionSource::Rollout);
            }

            if !meets_audience_conditions(self.config, rule, request.attributes, reasons) {
                reasons.info(format!(
                    "User \"{user_id}\" does not meet conditions for targeting rule \"{label}\"."
                ));
                continue;
            }
            reasons.info(format!(
                "User \"{user_id}\" meets conditions for targeting rule \"{label}\"."
            ));

            match bucketer::bucket(self.config, rule, request.bucketing_id, user_id, reasons) {
                Some(variation) => {
                    reasons.info(format!(
                        "User \"{user_id}\" is in the traffic group of targeting rule \"{label}\"."
                    ));
                    return FeatureDecision::new(rule, variation, DecisionSource::Rollout);
                }
                None => reasons.info(format!(
                    "User \"{user_id}\" is not in the traffic group of targeting rule \"{label}\"."
                )),
            }
        }

        FeatureDecision::none()
    }

    /// Resolve a flag: forced decisions, then experiments in order, then the
    /// rollout.
    ///
    /// A flag-level override replaces normal resolution, but an exact
    /// (flag, rule) override on any of the flag's rules still takes
    /// precedence over it. Without a flag-level override, rule overrides
    /// apply only when the waterfall reaches their rule.
    pub fn get_variation_for_feature(
        &self,
        flag: &'a Flag,
        request: &DecisionRequest<'_>,
        sticky: &mut StickyTracker<'_>,
        reasons: &mut DecisionReasons,
    ) -> FeatureDecision<'a> {
        let flag_context = DecisionContext::flag(&flag.key);
        if request
            .forced_decisions
            .is_some_and(|forced| forced.contains(&flag_context))
        {
            if let Some(decision) = self.forced_rule_decision(flag, request, reasons) {
                return decision;
            }
            if let Some(decision) = self.forced_flag_decision(flag, request, reasons) {
                return decision;
            }
        }

        for experiment in self.config.flag_experiments(flag) {
            if let Some(variation) = self.forced_rule_variation(flag, experiment, request, reasons) {
                return FeatureDecision::new(experiment, variation, DecisionSource::Experiment);
            }
            if let Some(variation) = self.get_variation(experiment, request, sticky, reasons) {
                reasons.info(format!(
                    "User \"{}\" is in variation \"{}\" of experiment \"{}\" for flag \"{}\".",
                    request.user_id, variation.key, experiment.key, flag.key
                ));
                return FeatureDecision::new(experiment, variation, DecisionSource::Experiment);
            }
        }

        let decision = self.get_variation_for_rollout(flag, request, reasons);
        if decision.variation.is_none() {
            reasons.info(format!(
                "User \"{}\" is not in any experiment or rollout of flag \"{}\".",
                request.user_id, flag.key
            ));
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forced::ForcedDecision;
    use crate::stores::{InMemoryStickyStore, StickyBucketStore, StoredBucketing};
    use serde_json::json;

    fn config() -> ProjectConfig {
        ProjectConfig::from_value(json!({
            "version": "4",
            "experiments": [
                {"id": "e_paused", "key": "paused", "status": "Paused",
                 "variations": [{"id": "vp", "key": "p"}],
                 "trafficAllocation": [{"entityId": "vp", "endOfRange": 10000}]},
                {"id": "e_main", "key": "main", "status": "Running",
                 "audienceIds": ["iphone"],
                 "forcedVariations": {"vip": "b", "ghost": "missing"},
                 "variations": [
                     {"id": "va", "key": "a", "featureEnabled": true},
                     {"id": "vb", "key": "b", "featureEnabled": false}
                 ],
                 "trafficAllocation": [{"entityId": "va", "endOfRange": 10000}]}
            ],
            "rollouts": [
                {"id": "r1", "experiments": [
                    {"id": "rule_beta", "key": "beta", "status": "Running",
                     "audienceConditions": ["or", "adult"],
                     "variations": [{"id": "rv1", "key": "beta_on", "featureEnabled": true}],
                     "trafficAllocation": [{"entityId": "rv1", "endOfRange": 10000}]},
                    {"id": "rule_zero", "key": "zero", "status": "Running",
                     "variations": [{"id": "rv2", "key": "zero_on", "featureEnabled": true}],
                     "trafficAllocation": []},
                    {"id": "rule_all", "key": "everyone", "status": "Running",
                     "variations": [{"id": "rv3", "key": "everyone_on", "featureEnabled": true}],
                     "trafficAllocation": [{"entityId": "rv3", "endOfRange": 10000}]}
                ]},
                {"id": "r2", "experiments": [
                    {"id": "rule_closed", "key": "closed", "status": "Running",
                     "variations": [{"id": "rv4", "key": "closed_on", "featureEnabled": true}],
                     "trafficAllocation": []}
                ]},
                {"id": "r3", "experiments": [
                    {"id": "rule_adults", "key": "adults", "status": "Running",
                     "audienceIds": ["adult"],
                     "variations": [{"id": "rv5", "key": "adults_on", "featureEnabled": true}],
                     "trafficAllocation": [{"entityId": "rv5", "endOfRange": 10000}]},
                    {"id": "rule_iphones", "key": "iphones", "status": "Running",
                     "audienceIds": ["iphone"],
                     "variations": [{"id": "rv6", "key": "iphones_on", "featureEnabled": true}],
                     "trafficAllocation": [{"entityId": "rv6", "endOfRange": 10000}]},
                    {"id": "rule_rest", "key": "rest", "status": "Running",
                     "variations": [{"id": "rv7", "key": "rest_on", "featureEnabled": true}],
                     "trafficAllocation": [{"entityId": "rv7", "endOfRange": 0}]}
                ]}
            ],
            "featureFlags": [
                {"id": "f1", "key": "main_flag", "experimentIds": ["e_main"], "rolloutId": "r1"},
                {"id": "f2", "key": "closed_flag", "experimentIds": [], "rolloutId": "r2"},
                {"id": "f3", "key": "bare", "experimentIds": ["e_paused"], "rolloutId": ""},
                {"id": "f4", "key": "layered_flag", "experimentIds": [], "rolloutId": "r3"}
            ],
            "typedAudiences": [
                {"id": "iphone", "name": "iPhone",
                 "conditions": ["and", {"name": "device_type", "type": "custom_attribute", "match": "exact", "value": "iPhone"}]},
                {"id": "adult", "name": "Adults",
                 "conditions": ["and", {"name": "age", "type": "custom_attribute", "match": "ge", "value": 18}]}
            ]
        }))
        .unwrap()
    }

    fn attributes(pairs: &[(&str, AttributeValue)]) -> UserAttributes {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn iphone() -> UserAttributes {
        attributes(&[("device_type", "iPhone".into())])
    }

    fn android(age: i64) -> UserAttributes {
        attributes(&[("device_type", "Android".into()), ("age", age.into())])
    }

    fn experiment_variation(
        config: &ProjectConfig,
        key: &str,
        user_id: &str,
        attributes: &UserAttributes,
        sticky: &mut StickyTracker<'_>,
        reasons: &mut DecisionReasons,
    ) -> Option<String> {
        let service = DecisionService::new(config);
        let experiment = config.experiment_by_key(key).unwrap();
        let request = DecisionRequest::new(user_id, attributes, reasons);
        service
            .get_variation(experiment, &request, sticky, reasons)
            .map(|v| v.key.clone())
    }

    fn feature(
        config: &ProjectConfig,
        flag_key: &str,
        attributes: &UserAttributes,
        forced: Option<&ForcedDecisions>,
    ) -> (Option<String>, Option<String>, DecisionSource) {
        let service = DecisionService::new(config);
        let flag = config.flag(flag_key).unwrap();
        let mut reasons = DecisionReasons::new();
        let mut request = DecisionRequest::new("u1", attributes, &mut reasons);
        if let Some(forced) = forced {
            request = request.with_forced_decisions(forced);
        }
        let decision = service.get_variation_for_feature(
            flag,
            &request,
            &mut StickyTracker::disabled(),
            &mut reasons,
        );
        (
            decision.experiment.map(|e| e.key.clone()),
            decision.variation.map(|v| v.key.clone()),
            decision.source,
        )
    }

    #[test]
    fn test_paused_experiment() {
        let config = config();
        let mut reasons = DecisionReasons::new();
        let result = experiment_variation(
            &config, "paused", "u1", &iphone(), &mut StickyTracker::disabled(), &mut reasons,
        );
        assert_eq!(result, None);
        assert!(reasons.contains("is not running"));
    }

    #[test]
    fn test_audience_gate() {
        let config = config();
        let mut reasons = DecisionReasons::new();
        let mut sticky = StickyTracker::disabled();
        assert_eq!(
            experiment_variation(&config, "main", "u1", &iphone(), &mut sticky, &mut reasons),
            Some("a".to_string())
        );
        assert_eq!(
            experiment_variation(&config, "main", "u1", &android(30), &mut sticky, &mut reasons),
            None
        );
    }

    #[test]
    fn test_whitelist_skips_audience() {
        let config = config();
        let mut reasons = DecisionReasons::new();
        let result = experiment_variation(
            &config, "main", "vip", &android(30), &mut StickyTracker::disabled(), &mut reasons,
        );
        assert_eq!(result, Some("b".to_string()));
        assert!(reasons.contains("is forced in variation \"b\""));
    }

    #[test]
    fn test_invalid_whitelist_entry_falls_through() {
        let config = config();
        let mut reasons = DecisionReasons::new();
        let result = experiment_variation(
            &config, "main", "ghost", &iphone(), &mut StickyTracker::disabled(), &mut reasons,
        );
        assert_eq!(result, Some("a".to_string()));
        assert_eq!(reasons.report(false).len(), 1);
    }

    #[test]
    fn test_sticky_recall_precedes_audience() {
        let config = config();
        let store = InMemoryStickyStore::new();
        let mut record = StoredBucketing::new("u1");
        record.assign("e_main", "vb");
        store.save(&record).unwrap();

        let mut reasons = DecisionReasons::new();
        let mut sticky = StickyTracker::new(Some(&store), "u1");
        let result = experiment_variation(
            &config, "main", "u1", &UserAttributes::new(), &mut sticky, &mut reasons,
        );
        assert_eq!(result, Some("b".to_string()));
        assert!(reasons.contains("previously stored variation"));
    }

    #[test]
    fn test_stale_sticky_entry_is_rebucketed_and_saved() {
        let config = config();
        let store = InMemoryStickyStore::new();
        let mut record = StoredBucketing::new("u1");
        record.assign("e_main", "deleted");
        store.save(&record).unwrap();

        let mut reasons = DecisionReasons::new();
        let mut sticky = StickyTracker::new(Some(&store), "u1");
        let result =
            experiment_variation(&config, "main", "u1", &iphone(), &mut sticky, &mut reasons);
        sticky.flush(&mut reasons);

        assert_eq!(result, Some("a".to_string()));
        let saved = store.lookup("u1").unwrap().unwrap();
        assert_eq!(saved.variation_id("e_main"), Some("va"));
    }

    #[test]
    fn test_bucketing_id_attribute() {
        let mut reasons = DecisionReasons::new();
        let with_id = attributes(&[(BUCKETING_ID_ATTRIBUTE, "shared".into())]);
        assert_eq!(bucketing_id("u1", &with_id, &mut reasons), "shared");
        assert!(reasons.is_empty());

        let numeric = attributes(&[(BUCKETING_ID_ATTRIBUTE, 5.into())]);
        assert_eq!(bucketing_id("u1", &numeric, &mut reasons), "u1");
        assert!(reasons.contains("not a string"));
    }

    #[test]
    fn test_rollout_first_matching_rule() {
        let config = config();
        let (rule, variation, source) = feature(&config, "main_flag", &android(30), None);
        assert_eq!(rule.as_deref(), Some("beta"));
        assert_eq!(variation.as_deref(), Some("beta_on"));
        assert_eq!(source, DecisionSource::Rollout);
    }

    #[test]
    fn test_rollout_falls_through_to_everyone_else() {
        let config = config();
        let (rule, variation, _) = feature(&config, "main_flag", &android(12), None);
        assert_eq!(rule.as_deref(), Some("everyone"));
        assert_eq!(variation.as_deref(), Some("everyone_on"));
    }

    #[test]
    fn test_catch_all_miss_is_no_decision() {
        let config = config();
        let (rule, variation, source) = feature(&config, "closed_flag", &iphone(), None);
        assert_eq!((rule, variation), (None, None));
        assert_eq!(source, DecisionSource::None);
    }

    #[test]
    fn test_every_rollout_rule_missing_is_no_decision() {
        let config = config();
        // Fails both targeted audiences, then misses the catch-all traffic.
        let (rule, variation, source) = feature(&config, "layered_flag", &android(12), None);
        assert_eq!((rule, variation), (None, None));
        assert_eq!(source, DecisionSource::None);

        // Either audience alone is enough to stop before the catch-all.
        let (rule, _, _) = feature(&config, "layered_flag", &android(40), None);
        assert_eq!(rule.as_deref(), Some("adults"));
        let (rule, _, _) = feature(&config, "layered_flag", &iphone(), None);
        assert_eq!(rule.as_deref(), Some("iphones"));
    }

    #[test]
    fn test_flag_without_rollout() {
        let config = config();
        let (_, variation, source) = feature(&config, "bare", &iphone(), None);
        assert_eq!(variation, None);
        assert_eq!(source, DecisionSource::None);
    }

    #[test]
    fn test_experiment_wins_over_rollout() {
        let config = config();
        let (rule, variation, source) = feature(&config, "main_flag", &iphone(), None);
        assert_eq!(rule.as_deref(), Some("main"));
        assert_eq!(variation.as_deref(), Some("a"));
        assert_eq!(source, DecisionSource::Experiment);
    }

    #[test]
    fn test_flag_level_forced_decision_source() {
        let config = config();
        let forced = ForcedDecisions::new();
        forced.set(DecisionContext::flag("main_flag"), ForcedDecision::new("everyone_on"));

        let (rule, variation, source) = feature(&config, "main_flag", &iphone(), Some(&forced));
        assert_eq!(rule.as_deref(), Some("everyone"));
        assert_eq!(variation.as_deref(), Some("everyone_on"));
        assert_eq!(source, DecisionSource::Rollout);

        forced.set(DecisionContext::flag("main_flag"), ForcedDecision::new("b"));
        let (_, variation, source) = feature(&config, "main_flag", &android(30), Some(&forced));
        assert_eq!(variation.as_deref(), Some("b"));
        assert_eq!(source, DecisionSource::Experiment);
    }

    #[test]
    fn test_exact_rule_override_beats_flag_override() {
        let config = config();
        let forced = ForcedDecisions::new();
        forced.set(DecisionContext::flag("main_flag"), ForcedDecision::new("everyone_on"));
        forced.set(DecisionContext::rule("main_flag", "main"), ForcedDecision::new("b"));

        let (rule, variation, source) = feature(&config, "main_flag", &iphone(), Some(&forced));
        assert_eq!(rule.as_deref(), Some("main"));
        assert_eq!(variation.as_deref(), Some("b"));
        assert_eq!(source, DecisionSource::Experiment);

        // A rollout rule override also wins over the flag-level one.
        forced.remove(&DecisionContext::rule("main_flag", "main"));
        forced.set(DecisionContext::rule("main_flag", "zero"), ForcedDecision::new("zero_on"));
        let (rule, variation, source) = feature(&config, "main_flag", &iphone(), Some(&forced));
        assert_eq!(rule.as_deref(), Some("zero"));
        assert_eq!(variation.as_deref(), Some("zero_on"));
        assert_eq!(source, DecisionSource::Rollout);

        // An invalid rule override leaves the flag-level one in charge.
        forced.set(DecisionContext::rule("main_flag", "zero"), ForcedDecision::new("nonexistent"));
        let (rule, variation, _) = feature(&config, "main_flag", &iphone(), Some(&forced));
        assert_eq!(rule.as_deref(), Some("everyone"));
        assert_eq!(variation.as_deref(), Some("everyone_on"));
    }

    #[test]
    fn test_rule_level_forced_decisions() {
        let config = config();
        let forced = ForcedDecisions::new();
        forced.set(DecisionContext::rule("main_flag", "main"), ForcedDecision::new("b"));
        let (rule, variation, source) = feature(&config, "main_flag", &android(12), Some(&forced));
        assert_eq!(rule.as_deref(), Some("main"));
        assert_eq!(variation.as_deref(), Some("b"));
        assert_eq!(source, DecisionSource::Experiment);

        forced.remove_all();
        forced.set(DecisionContext::rule("main_flag", "zero"), ForcedDecision::new("zero_on"));
        let (rule, variation, source) = feature(&config, "main_flag", &android(12), Some(&forced));
        assert_eq!(rule.as_deref(), Some("zero"));
        assert_eq!(variation.as_deref(), Some("zero_on"));
        assert_eq!(source, DecisionSource::Rollout);
    }

    #[test]
    fn test_invalid_forced_decision_falls_through() {
        let config = config();
        let forced = ForcedDecisions::new();
        forced.set(DecisionContext::flag("main_flag"), ForcedDecision::new("nonexistent"));
        let (_, variation, source) = feature(&config, "main_flag", &iphone(), Some(&forced));
        assert_eq!(variation.as_deref(), Some("a"));
        assert_eq!(source, DecisionSource::Experiment);
    }
}
