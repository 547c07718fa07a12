//! Three-valued condition evaluation
//!
//! Missing or mistyped attributes make a predicate *unknown* rather than
//! false, and unknown propagates through `and`/`or`/`not` the way SQL `NULL`
//! does. Callers coerce the final result: only `True` qualifies.

use vane_config::ConditionTree;

/// Result of evaluating a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    /// Unknown and false both fail to qualify.
    pub fn is_true(self) -> bool {
        self == Self::True
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::ops::Not for Tristate {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

/// Evaluate a tree, delegating leaves to `leaf`.
///
/// The empty list at the root places no restriction and is `True`; an
/// explicit `or` with no operands is `False`.
pub fn evaluate<L, F>(tree: &ConditionTree<L>, leaf: &mut F) -> Tristate
where
    F: FnMut(&L) -> Tristate,
{
    evaluate_node(tree, leaf)
}

fn evaluate_node<L, F>(tree: &ConditionTree<L>, leaf: &mut F) -> Tristate
where
    F: FnMut(&L) -> Tristate,
{
    match tree {
        ConditionTree::Unrestricted => Tristate::True,
        ConditionTree::Leaf(condition) => leaf(condition),
        ConditionTree::And(operands) => and(operands, leaf),
        ConditionTree::Or(operands) => or(operands, leaf),
        ConditionTree::Not(operands) => operands
            .first()
            .map_or(Tristate::Unknown, |operand| !evaluate_node(operand, leaf)),
    }
}

fn and<L, F>(operands: &[ConditionTree<L>], leaf: &mut F) -> Tristate
where
    F: FnMut(&L) -> Tristate,
{
    let mut saw_unknown = false;
    for operand in operands {
        match evaluate_node(operand, leaf) {
            Tristate::False => return Tristate::False,
            Tristate::Unknown => saw_unknown = true,
            Tristate::True => {}
        }
    }
    if saw_unknown { Tristate::Unknown } else { Tristate::True }
}

fn or<L, F>(operands: &[ConditionTree<L>], leaf: &mut F) -> Tristate
where
    F: FnMut(&L) -> Tristate,
{
    let mut saw_unknown = false;
    for operand in operands {
        match evaluate_node(operand, leaf) {
            Tristate::True => return Tristate::True,
            Tristate::Unknown => saw_unknown = true,
            Tristate::False => {}
        }
    }
    if saw_unknown { Tristate::Unknown } else { Tristate::False }
}
