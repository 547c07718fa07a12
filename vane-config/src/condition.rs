//! Condition trees
//!
//! Audience expressions are nested arrays headed by an optional `and`/`or`/`not`
//! operator. They are parsed once, at load time, into [`ConditionTree`], a plain
//! recursive enum that the decision crate walks with three-valued logic.
//!
//! Two leaf types are used:
//!
//! - experiments reference audiences by id (`ConditionTree<String>`)
//! - audiences hold attribute predicates (`ConditionTree<UserCondition>`)

use crate::{ConfigError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Recursive boolean expression over leaves of type `L`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTree<L> {
    Leaf(L),
    And(Vec<ConditionTree<L>>),
    Or(Vec<ConditionTree<L>>),
    /// Only the first operand is negated; extra operands are ignored.
    Not(Vec<ConditionTree<L>>),
    /// The empty list `[]` at the root; places no restriction. Nested empty
    /// lists and operators without operands parse as their operator instead.
    Unrestricted,
}

impl<L> ConditionTree<L> {
    /// Build an implicit `or` over a flat list of leaves.
    pub fn any_of(leaves: impl IntoIterator<Item = L>) -> Self {
        Self::Or(leaves.into_iter().map(Self::Leaf).collect())
    }

    /// True for the root empty list `[]`, which places no restriction.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Parse a JSON expression, delegating leaves to `leaf`.
    pub fn parse<F>(value: &Value, leaf: &F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<L>,
    {
        match value {
            Value::Array(items) if items.is_empty() => Ok(Self::Unrestricted),
            _ => Self::parse_node(value, leaf),
        }
    }

    fn parse_node<F>(value: &Value, leaf: &F) -> Result<Self>
    where
        F: Fn(&Value) -> Result<L>,
    {
        let Value::Array(items) = value else {
            return leaf(value).map(Self::Leaf);
        };

        let (operator, operands) = match items.first().and_then(Value::as_str) {
            Some("and") => (Operator::And, &items[1..]),
            Some("or") => (Operator::Or, &items[1..]),
            Some("not") => (Operator::Not, &items[1..]),
            _ => (Operator::Or, &items[..]),
        };

        let children = operands
            .iter()
            .map(|operand| Self::parse_node(operand, leaf))
            .collect::<Result<Vec<_>>>()?;

        Ok(match operator {
            Operator::And => Self::And(children),
            Operator::Or => Self::Or(children),
            Operator::Not => Self::Not(children),
        })
    }

    /// Iterate over every leaf, depth first.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        match self {
            Self::Leaf(leaf) => out.push(leaf),
            Self::Unrestricted => {}
            Self::And(children) | Self::Or(children) | Self::Not(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Operator {
    And,
    Or,
    Not,
}

/// Leaf predicate over one user attribute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserCondition {
    /// Attribute name
    pub name: String,

    /// Condition type; only `custom_attribute` is evaluated
    #[serde(default, rename = "type")]
    pub kind: String,

    /// Match type, `exact` when absent
    #[serde(default, rename = "match")]
    pub match_type: Option<MatchType>,

    /// Value to compare against
    #[serde(default)]
    pub value: Value,
}

impl UserCondition {
    pub const CUSTOM_ATTRIBUTE: &'static str = "custom_attribute";
}

impl fmt::Display for UserCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"name\":\"{}\",\"type\":\"{}\"", self.name, self.kind)?;
        if let Some(match_type) = &self.match_type {
            write!(f, ",\"match\":\"{}\"", match_type.as_str())?;
        }
        write!(f, ",\"value\":{}}}", self.value)
    }
}

/// Attribute match types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MatchType {
    Exact,
    Exists,
    Substring,
    Gt,
    Ge,
    Lt,
    Le,
    SemverEq,
    SemverGt,
    SemverGe,
    SemverLt,
    SemverLe,
    Unrecognized(String),
}

impl MatchType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact => "exact",
            Self::Exists => "exists",
            Self::Substring => "substring",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::SemverEq => "semver_eq",
            Self::SemverGt => "semver_gt",
            Self::SemverGe => "semver_ge",
            Self::SemverLt => "semver_lt",
            Self::SemverLe => "semver_le",
            Self::Unrecognized(other) => other,
        }
    }
}

impl From<String> for MatchType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exact" => Self::Exact,
            "exists" => Self::Exists,
            "substring" => Self::Substring,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "semver_eq" => Self::SemverEq,
            "semver_gt" => Self::SemverGt,
            "semver_ge" => Self::SemverGe,
            "semver_lt" => Self::SemverLt,
            "semver_le" => Self::SemverLe,
            _ => Self::Unrecognized(value),
        }
    }
}

fn audience_ref(value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::condition(format!("expected audience id, found {value}")))
}

fn user_condition(value: &Value) -> Result<UserCondition> {
    if !value.is_object() {
        return Err(ConfigError::condition(format!(
            "expected attribute condition object, found {value}"
        )));
    }
    serde_json::from_value(value.clone()).map_err(|e| ConfigError::condition(e.to_string()))
}

/// Parse an experiment's audience-id expression.
pub fn parse_audience_refs(value: &Value) -> Result<ConditionTree<String>> {
    ConditionTree::parse(value, &audience_ref)
}

/// Parse an audience's attribute expression. Legacy audiences carry the
/// expression as a JSON-encoded string.
pub fn parse_user_conditions(value: &Value) -> Result<ConditionTree<UserCondition>> {
    match value {
        Value::String(encoded) => {
            let decoded: Value = serde_json::from_str(encoded)?;
            ConditionTree::parse(&decoded, &user_condition)
        }
        other => ConditionTree::parse(other, &user_condition),
    }
}

pub(crate) fn deserialize_audience_refs<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<ConditionTree<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_audience_refs(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub(crate) fn deserialize_user_conditions<'de, D>(
    deserializer: D,
) -> std::result::Result<ConditionTree<UserCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_user_conditions(&value).map_err(serde::de::Error::custom)
}
