//! Error types for decisions and sticky-bucketing stores

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for decision entry points that can fail outright
pub type DecisionResult<T> = Result<T, DecisionError>;

/// Sticky-bucketing store errors
///
/// These never escape a decision call; the decision service logs them and
/// carries on as if no store were configured.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup failed
    #[error("Sticky bucketing lookup failed: {0}")]
    Lookup(String),

    /// Save failed
    #[error("Sticky bucketing save failed: {0}")]
    Save(String),

    /// Stored record could not be encoded or decoded
    #[error("Sticky bucketing record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a new lookup error
    pub fn lookup<S: Into<String>>(msg: S) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a new save error
    pub fn save<S: Into<String>>(msg: S) -> Self {
        Self::Save(msg.into())
    }
}

/// Decision errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// No configuration snapshot has been supplied yet
    #[error("Engine has no valid configuration; decisions are not available")]
    NotReady,

    /// Requested flag key is not in the configuration
    #[error("No flag was found for key \"{0}\"")]
    FlagNotFound(String),

    /// Requested experiment key is not in the configuration
    #[error("No experiment was found for key \"{0}\"")]
    ExperimentNotFound(String),
}
