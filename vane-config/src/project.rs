//! Project configuration snapshot
//!
//! [`ProjectConfig`] owns the cross-referenced entity graph and the lookup
//! tables the decision engine reads. A snapshot is never mutated after it is
//! built; swapping configuration means building a new snapshot.

use crate::entities::{Audience, Experiment, Flag, Group, Rollout, Variation};
use crate::loader::{ConfigLoader, Datafile};
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Immutable, indexed configuration
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    version: String,
    revision: String,
    account_id: String,
    project_id: String,
    experiments: HashMap<String, Experiment>,
    experiment_keys: HashMap<String, String>,
    groups: HashMap<String, Group>,
    rollouts: HashMap<String, Rollout>,
    flags: HashMap<String, Flag>,
    flag_order: Vec<String>,
    audiences: HashMap<String, Audience>,
}

impl ProjectConfig {
    /// Parse a datafile from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        ConfigLoader::parse(content)
    }

    /// Build from a decoded JSON document
    pub fn from_value(value: Value) -> Result<Self> {
        ConfigLoader::from_value(value)
    }

    /// Load a datafile from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::load_file(path)
    }

    pub(crate) fn from_datafile(datafile: Datafile) -> Self {
        let mut config = Self {
            version: datafile.version,
            revision: datafile.revision,
            account_id: datafile.account_id,
            project_id: datafile.project_id,
            ..Self::default()
        };

        for entry in datafile.groups {
            let (group, members) = entry.into_parts();
            for experiment in members {
                config.insert_experiment(experiment);
            }
            config.groups.insert(group.id.clone(), group);
        }
        for experiment in datafile.experiments {
            config.insert_experiment(experiment);
        }

        for rollout in datafile.rollouts {
            config.rollouts.insert(rollout.id.clone(), rollout);
        }

        for mut flag in datafile.feature_flags {
            if flag.rollout_id.as_deref() == Some("") {
                flag.rollout_id = None;
            }
            let key = flag.key.clone();
            if config.flags.insert(key.clone(), flag).is_some() {
                warn!(flag_key = %key, "Duplicate flag key in datafile; keeping the last");
            } else {
                config.flag_order.push(key);
            }
        }

        // Typed audiences replace legacy audiences sharing an id.
        for audience in datafile.audiences.into_iter().chain(datafile.typed_audiences) {
            config.audiences.insert(audience.id.clone(), audience);
        }

        config
    }

    fn insert_experiment(&mut self, experiment: Experiment) {
        if !experiment.key.is_empty() {
            self.experiment_keys
                .insert(experiment.key.clone(), experiment.id.clone());
        }
        self.experiments.insert(experiment.id.clone(), experiment);
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Experiment by id
    pub fn experiment(&self, id: &str) -> Option<&Experiment> {
        let experiment = self.experiments.get(id);
        if experiment.is_none() {
            warn!(experiment_id = %id, "Experiment id not in datafile");
        }
        experiment
    }

    /// Experiment by key
    pub fn experiment_by_key(&self, key: &str) -> Option<&Experiment> {
        let experiment = self
            .experiment_keys
            .get(key)
            .and_then(|id| self.experiments.get(id));
        if experiment.is_none() {
            warn!(experiment_key = %key, "Experiment key not in datafile");
        }
        experiment
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        let group = self.groups.get(id);
        if group.is_none() {
            warn!(group_id = %id, "Group id not in datafile");
        }
        group
    }

    pub fn rollout(&self, id: &str) -> Option<&Rollout> {
        let rollout = self.rollouts.get(id);
        if rollout.is_none() {
            warn!(rollout_id = %id, "Rollout id not in datafile");
        }
        rollout
    }

    /// Flag by key
    pub fn flag(&self, key: &str) -> Option<&Flag> {
        let flag = self.flags.get(key);
        if flag.is_none() {
            warn!(flag_key = %key, "Flag key not in datafile");
        }
        flag
    }

    /// Audience by id; missing ids are expected to evaluate as unknown
    pub fn audience(&self, id: &str) -> Option<&Audience> {
        let audience = self.audiences.get(id);
        if audience.is_none() {
            warn!(audience_id = %id, "Audience id not in datafile");
        }
        audience
    }

    /// Flags in datafile order
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flag_order.iter().filter_map(|key| self.flags.get(key))
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    /// All experiments, group members included, rollout rules excluded
    pub fn experiments(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn rollouts(&self) -> impl Iterator<Item = &Rollout> {
        self.rollouts.values()
    }

    /// Experiments attached to a flag, in flag order. Dangling ids are skipped.
    pub fn flag_experiments<'a>(&'a self, flag: &'a Flag) -> impl Iterator<Item = &'a Experiment> + 'a {
        flag.experiment_ids
            .iter()
            .filter_map(move |id| self.experiment(id))
    }

    /// Rollout attached to a flag, if any
    pub fn flag_rollout(&self, flag: &Flag) -> Option<&Rollout> {
        flag.rollout_id.as_deref().and_then(|id| self.rollout(id))
    }

    /// Find a variation the flag can route to, with the rule that owns it.
    ///
    /// Searches the flag's experiments first, then its rollout rules.
    pub fn flag_variation(
        &self,
        flag_key: &str,
        variation_key: &str,
    ) -> Option<(&Experiment, &Variation)> {
        let flag = self.flags.get(flag_key)?;

        let experiments = flag
            .experiment_ids
            .iter()
            .filter_map(|id| self.experiments.get(id));
        let rules = flag
            .rollout_id
            .as_deref()
            .and_then(|id| self.rollouts.get(id))
            .into_iter()
            .flat_map(|rollout| rollout.rules.iter());

        experiments
            .chain(rules)
            .find_map(|rule| rule.variation_by_key(variation_key).map(|v| (rule, v)))
    }
}
