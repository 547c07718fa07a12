//! Audience resolution
//!
//! Combines the condition-tree evaluator with audience lookups: the
//! experiment's audience expression has audience ids at its leaves, and each
//! id expands into that audience's own attribute-predicate tree.

use crate::condition::{Tristate, evaluate};
use crate::matcher::evaluate_condition;
use crate::reasons::DecisionReasons;
use vane_config::{Experiment, ProjectConfig, UserAttributes};

/// Whether a user qualifies for an experiment or rollout rule.
///
/// No audience expression, or an empty one, admits everyone. Unknown
/// results do not qualify.
pub fn meets_audience_conditions(
    config: &ProjectConfig,
    experiment: &Experiment,
    attributes: &UserAttributes,
    reasons: &mut DecisionReasons,
) -> bool {
    let Some(tree) = experiment.audience_tree() else {
        reasons.info(format!(
            "\"{}\" has no audience conditions; everyone qualifies.",
            experiment.key
        ));
        return true;
    };

    let result = evaluate(&*tree, &mut |audience_id: &String| {
        evaluate_audience(config, audience_id, attributes)
    });

    reasons.info(format!(
        "Audiences for \"{}\" collectively evaluated to {}.",
        experiment.key,
        result.as_str()
    ));
    result.is_true()
}

/// Evaluate a single audience by id. Unknown ids evaluate as unknown.
pub fn evaluate_audience(
    config: &ProjectConfig,
    audience_id: &str,
    attributes: &UserAttributes,
) -> Tristate {
    let Some(audience) = config.audience(audience_id) else {
        return Tristate::Unknown;
    };
    let result = evaluate(&audience.conditions, &mut |condition| {
        evaluate_condition(condition, attributes)
    });
    tracing::debug!(
        audience_id = %audience.id,
        audience = %audience.name,
        result = result.as_str(),
        "Evaluated audience"
    );
    result
}
