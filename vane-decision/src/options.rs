//! Decide options

use serde::{Deserialize, Serialize};

/// Per-call switches for the `decide` family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecideOption {
    /// Neither read nor write the sticky bucketing store
    IgnoreStickyBucketing,
    /// Return informational reasons as well as errors
    IncludeReasons,
    /// Drop disabled flags from multi-flag results
    EnabledFlagsOnly,
    /// Leave `variables` empty
    ExcludeVariables,
}

/// Engine defaults merged with call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub ignore_sticky_bucketing: bool,
    pub include_reasons: bool,
    pub enabled_flags_only: bool,
    pub exclude_variables: bool,
}

impl ResolvedOptions {
    pub fn merge(defaults: &[DecideOption], options: &[DecideOption]) -> Self {
        defaults
            .iter()
            .chain(options)
            .fold(Self::default(), |mut resolved, option| {
                match option {
                    DecideOption::IgnoreStickyBucketing => resolved.ignore_sticky_bucketing = true,
                    DecideOption::IncludeReasons => resolved.include_reasons = true,
                    DecideOption::EnabledFlagsOnly => resolved.enabled_flags_only = true,
                    DecideOption::ExcludeVariables => resolved.exclude_variables = true,
                }
                resolved
            })
    }
}
