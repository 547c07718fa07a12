//! Attribute predicate evaluation
//!
//! Evaluates a single [`UserCondition`] leaf against the user's attributes.
//! Anything ambiguous (missing attribute, mismatched types, unusable
//! condition values) is `Unknown`, never an error.

use crate::condition::Tristate;
use crate::semver::SemanticVersion;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, warn};
use vane_config::{AttributeValue, MatchType, UserAttributes, UserCondition};

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_SAFE_NUMBER: f64 = 9_007_199_254_740_992.0;

/// Evaluate one attribute predicate.
pub fn evaluate_condition(condition: &UserCondition, attributes: &UserAttributes) -> Tristate {
    if condition.kind != UserCondition::CUSTOM_ATTRIBUTE {
        warn!(condition = %condition, "Unknown condition type; evaluating as unknown");
        return Tristate::Unknown;
    }

    let match_type = condition.match_type.as_ref().unwrap_or(&MatchType::Exact);
    let attribute = attributes.get(&condition.name);

    if *match_type == MatchType::Exists {
        return Tristate::from(attribute.is_some_and(|value| !value.is_null()));
    }

    if let MatchType::Unrecognized(name) = match_type {
        warn!(condition = %condition, match_type = %name, "Unknown match type; evaluating as unknown");
        return Tristate::Unknown;
    }

    let Some(attribute) = attribute.filter(|value| !value.is_null()) else {
        debug!(
            condition = %condition,
            attribute = %condition.name,
            "No value supplied for attribute"
        );
        return Tristate::Unknown;
    };

    match match_type {
        MatchType::Exact => exact(condition, attribute),
        MatchType::Substring => substring(condition, attribute),
        MatchType::Gt => numeric(condition, attribute, |o| o == Ordering::Greater),
        MatchType::Ge => numeric(condition, attribute, |o| o != Ordering::Less),
        MatchType::Lt => numeric(condition, attribute, |o| o == Ordering::Less),
        MatchType::Le => numeric(condition, attribute, |o| o != Ordering::Greater),
        MatchType::SemverEq => semver(condition, attribute, |o| o == Ordering::Equal),
        MatchType::SemverGt => semver(condition, attribute, |o| o == Ordering::Greater),
        MatchType::SemverGe => semver(condition, attribute, |o| o != Ordering::Less),
        MatchType::SemverLt => semver(condition, attribute, |o| o == Ordering::Less),
        MatchType::SemverLe => semver(condition, attribute, |o| o != Ordering::Greater),
        MatchType::Exists | MatchType::Unrecognized(_) => Tristate::Unknown,
    }
}

fn is_usable_number(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_SAFE_NUMBER
}

fn condition_number(condition: &UserCondition) -> Option<f64> {
    condition.value.as_f64().filter(|n| is_usable_number(*n))
}

fn type_mismatch(condition: &UserCondition, attribute: &AttributeValue) -> Tristate {
    warn!(
        condition = %condition,
        attribute_type = attribute.type_name(),
        "Attribute type does not match condition; evaluating as unknown"
    );
    Tristate::Unknown
}

fn invalid_condition(condition: &UserCondition) -> Tristate {
    warn!(condition = %condition, "Condition value is not usable with its match type");
    Tristate::Unknown
}

fn exact(condition: &UserCondition, attribute: &AttributeValue) -> Tristate {
    match &condition.value {
        Value::String(expected) => match attribute.as_str() {
            Some(actual) => Tristate::from(actual == expected),
            None => type_mismatch(condition, attribute),
        },
        Value::Bool(expected) => match attribute.as_bool() {
            Some(actual) => Tristate::from(actual == *expected),
            None => type_mismatch(condition, attribute),
        },
        Value::Number(_) => {
            let Some(expected) = condition_number(condition) else {
                return invalid_condition(condition);
            };
            match attribute.as_f64() {
                Some(actual) if is_usable_number(actual) => Tristate::from(actual == expected),
                Some(_) => {
                    warn!(condition = %condition, "Attribute value is out of numeric range");
                    Tristate::Unknown
                }
                None => type_mismatch(condition, attribute),
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => invalid_condition(condition),
    }
}

fn substring(condition: &UserCondition, attribute: &AttributeValue) -> Tristate {
    let Some(expected) = condition.value.as_str() else {
        return invalid_condition(condition);
    };
    match attribute.as_str() {
        Some(actual) => Tristate::from(actual.contains(expected)),
        None => type_mismatch(condition, attribute),
    }
}

fn numeric(
    condition: &UserCondition,
    attribute: &AttributeValue,
    accept: impl Fn(Ordering) -> bool,
) -> Tristate {
    let Some(expected) = condition_number(condition) else {
        return invalid_condition(condition);
    };
    let Some(actual) = attribute.as_f64() else {
        return type_mismatch(condition, attribute);
    };
    if !is_usable_number(actual) {
        warn!(condition = %condition, "Attribute value is out of numeric range");
        return Tristate::Unknown;
    }
    actual
        .partial_cmp(&expected)
        .map_or(Tristate::Unknown, |ordering| Tristate::from(accept(ordering)))
}

fn semver(
    condition: &UserCondition,
    attribute: &AttributeValue,
    accept: impl Fn(Ordering) -> bool,
) -> Tristate {
    let Some(target) = condition.value.as_str().and_then(SemanticVersion::parse) else {
        return invalid_condition(condition);
    };
    let Some(raw) = attribute.as_str() else {
        return type_mismatch(condition, attribute);
    };
    let Some(actual) = SemanticVersion::parse(raw) else {
        warn!(condition = %condition, version = %raw, "Attribute is not a valid semantic version");
        return Tristate::Unknown;
    };
    Tristate::from(accept(actual.compare_to_target(&target)))
}
