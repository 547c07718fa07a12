//! Decision engine and builder

use crate::error::{DecisionError, DecisionResult};
use crate::options::DecideOption;
use crate::reasons::DecisionReasons;
use crate::service::{DecisionRequest, DecisionService};
use crate::stores::{StickyBucketStore, StickyTracker};
use crate::user::UserContext;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};
use vane_config::{ProjectConfig, UserAttributes};

struct EngineInner {
    config: RwLock<Option<Arc<ProjectConfig>>>,
    sticky_store: Option<Arc<dyn StickyBucketStore>>,
    default_options: Vec<DecideOption>,
}

/// Entry point for decisions
///
/// Holds the current configuration snapshot and the optional sticky store.
/// Cloning is cheap; clones share state. Each decision call works on the
/// snapshot that was current when it started.
#[derive(Clone)]
pub struct DecisionEngine {
    inner: Arc<EngineInner>,
}

impl DecisionEngine {
    /// Create a new engine builder
    pub fn builder() -> DecisionEngineBuilder {
        DecisionEngineBuilder::new()
    }

    /// Create an engine with a configuration and no sticky store
    pub fn new(config: ProjectConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Swap in a new configuration snapshot
    pub fn update_config(&self, config: impl Into<Arc<ProjectConfig>>) {
        let config = config.into();
        info!(
            revision = %config.revision(),
            flags = config.flag_count(),
            "Configuration updated"
        );
        *self.inner.config.write() = Some(config);
    }

    /// Current configuration snapshot, if one has been supplied
    pub fn config(&self) -> Option<Arc<ProjectConfig>> {
        self.inner.config.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.config.read().is_some()
    }

    pub fn has_sticky_store(&self) -> bool {
        self.inner.sticky_store.is_some()
    }

    pub fn default_options(&self) -> &[DecideOption] {
        &self.inner.default_options
    }

    /// Create a decision context for one user
    pub fn create_user_context(
        &self,
        user_id: impl Into<String>,
        attributes: UserAttributes,
    ) -> UserContext {
        UserContext::new(self.clone(), user_id.into(), attributes)
    }

    /// Variation key a user gets in one experiment, outside of any flag.
    ///
    /// Uses the whitelist, the sticky store, audiences and bucketing;
    /// forced decisions only apply to flags.
    pub fn variation_for_experiment(
        &self,
        experiment_key: &str,
        user_id: &str,
        attributes: &UserAttributes,
    ) -> DecisionResult<Option<String>> {
        let config = self.config().ok_or(DecisionError::NotReady)?;
        let experiment = config
            .experiment_by_key(experiment_key)
            .ok_or_else(|| DecisionError::ExperimentNotFound(experiment_key.to_string()))?;

        let mut reasons = DecisionReasons::new();
        let request = DecisionRequest::new(user_id, attributes, &mut reasons);
        let mut sticky = self.sticky_tracker(user_id, false);
        let variation = DecisionService::new(&config)
            .get_variation(experiment, &request, &mut sticky, &mut reasons)
            .map(|variation| variation.key.clone());
        sticky.flush(&mut reasons);

        debug!(
            experiment_key = %experiment_key,
            user_id = %user_id,
            variation = ?variation,
            "Experiment decision"
        );
        Ok(variation)
    }

    pub(crate) fn sticky_tracker(&self, user_id: &str, ignore: bool) -> StickyTracker<'_> {
        match &self.inner.sticky_store {
            Some(store) if !ignore => StickyTracker::new(Some(store.as_ref()), user_id),
            _ => StickyTracker::disabled(),
        }
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.inner.config.read();
        f.debug_struct("DecisionEngine")
            .field("revision", &config.as_ref().map(|c| c.revision().to_string()))
            .field(
                "sticky_store",
                &self.inner.sticky_store.as_ref().map(|s| s.store_type()),
            )
            .field("default_options", &self.inner.default_options)
            .finish()
    }
}

/// Builder for creating a DecisionEngine
pub struct DecisionEngineBuilder {
    config: Option<Arc<ProjectConfig>>,
    sticky_store: Option<Arc<dyn StickyBucketStore>>,
    default_options: Vec<DecideOption>,
}

impl DecisionEngineBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: None,
            sticky_store: None,
            default_options: Vec::new(),
        }
    }

    /// Set the initial configuration; without one, decisions report not ready
    pub fn config(mut self, config: impl Into<Arc<ProjectConfig>>) -> Self {
        self.config = Some(config.into());
        self
    }

    /// Use a sticky bucketing store
    pub fn sticky_store(mut self, store: Arc<dyn StickyBucketStore>) -> Self {
        self.sticky_store = Some(store);
        self
    }

    /// Options applied to every decide call in addition to its own
    pub fn default_decide_options(
        mut self,
        options: impl IntoIterator<Item = DecideOption>,
    ) -> Self {
        self.default_options.extend(options);
        self
    }

    /// Build the engine
    pub fn build(self) -> DecisionEngine {
        debug!(
            has_config = self.config.is_some(),
            sticky_store = ?self.sticky_store.as_ref().map(|s| s.store_type()),
            default_options = ?self.default_options,
            "Building decision engine"
        );

        DecisionEngine {
            inner: Arc::new(EngineInner {
                config: RwLock::new(self.config),
                sticky_store: self.sticky_store,
                default_options: self.default_options,
            }),
        }
    }
}

impl Default for DecisionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
