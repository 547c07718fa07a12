// Datafile loading

use crate::entities::{Audience, Experiment, Flag, Group, GroupPolicy, Rollout, TrafficAllocation};
use crate::validation::Validate;
use crate::{ConfigError, ProjectConfig, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Datafile versions the loader understands
pub const SUPPORTED_VERSIONS: &[&str] = &["2", "3", "4"];

/// Raw datafile document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Datafile {
    pub version: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub feature_flags: Vec<Flag>,
    #[serde(default)]
    pub rollouts: Vec<Rollout>,
    #[serde(default)]
    pub audiences: Vec<Audience>,
    #[serde(default)]
    pub typed_audiences: Vec<Audience>,
}

/// Group as it appears in a datafile, members nested inside
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupEntry {
    pub id: String,
    #[serde(default)]
    pub policy: GroupPolicy,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub traffic_allocation: Vec<TrafficAllocation>,
}

impl GroupEntry {
    /// Split into the group and its member experiments, tagging each member
    /// with the group id.
    pub fn into_parts(self) -> (Group, Vec<Experiment>) {
        let members: Vec<Experiment> = self
            .experiments
            .into_iter()
            .map(|mut experiment| {
                experiment.group_id = Some(self.id.clone());
                experiment
            })
            .collect();

        let group = Group {
            id: self.id,
            policy: self.policy,
            experiment_ids: members.iter().map(|e| e.id.clone()).collect(),
            traffic_allocation: self.traffic_allocation,
        };

        (group, members)
    }
}

/// Datafile loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a datafile from disk
    pub fn load_file(path: impl AsRef<Path>) -> Result<ProjectConfig> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading datafile");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a datafile from a JSON string
    pub fn parse(content: &str) -> Result<ProjectConfig> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Build a configuration from an already-decoded JSON document
    pub fn from_value(value: Value) -> Result<ProjectConfig> {
        let version = value
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion(version.to_string()));
        }

        let datafile: Datafile = serde_json::from_value(value)?;
        let config = ProjectConfig::from_datafile(datafile);
        config.validate()?;

        debug!(
            revision = %config.revision(),
            flags = config.flag_count(),
            "Datafile loaded"
        );
        Ok(config)
    }
}
