//! Decision reasons
//!
//! Human-readable trail of how a decision was reached. Reasons are for
//! diagnostics and tests; nothing branches on them.

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reason {
    Info(String),
    Error(String),
}

/// Ordered reasons accumulated along a resolution path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionReasons {
    entries: Vec<Reason>,
}

impl DecisionReasons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational step. Also logged at debug level.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "vane::decision", "{}", message);
        self.entries.push(Reason::Info(message));
    }

    /// Record an anomaly. Also logged at warn level.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "vane::decision", "{}", message);
        self.entries.push(Reason::Error(message));
    }

    pub fn append(&mut self, other: DecisionReasons) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every message, in order.
    pub fn messages(&self) -> Vec<String> {
        self.report(true)
    }

    /// Messages to hand back to callers: errors always, info only on request.
    pub fn report(&self, include_info: bool) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Reason::Error(message) => Some(message.clone()),
                Reason::Info(message) if include_info => Some(message.clone()),
                Reason::Info(_) => None,
            })
            .collect()
    }

    /// Whether any message contains `needle`. Handy in tests.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            Reason::Info(message) | Reason::Error(message) => message.contains(needle),
        })
    }
}
