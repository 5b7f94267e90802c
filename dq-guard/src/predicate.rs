//! Backend-neutral row predicates.
//!
//! Constraints describe the rows they reject as a [`Predicate`]; each backend
//! translates the tree once (to SQL, or to an in-process evaluator). Evaluation
//! follows SQL three-valued logic: a comparison against null is unknown, and
//! unknown rows are never selected by a filter.

use crate::value::Value;

/// A row predicate over a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    NotEq(Value),
    Lt(Value),
    Gt(Value),
    LtEq(Value),
    GtEq(Value),
    /// Inclusive range `low <= v <= high`.
    Between(Value, Value),
    /// `v < low or v > high`.
    NotBetween(Value, Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Contains(String),
    NotContains(String),
    StartsWith(String),
    NotStartsWith(String),
    EndsWith(String),
    NotEndsWith(String),
    /// The value matches the pattern. Anchoring is the caller's business.
    Regex(String),
    NotRegex(String),
    IsNull,
    /// The value is the empty string.
    IsEmpty,
    /// The value is a not-a-number marker.
    IsNaN,
    Not(Box<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Negates the predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Matches any of the given predicates.
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::Or(predicates.into_iter().collect())
    }

    /// Matches all of the given predicates.
    pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::And(predicates.into_iter().collect())
    }

    /// Short operator-like label, used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Predicate::Eq(_) => "=",
            Predicate::NotEq(_) => "<>",
            Predicate::Lt(_) => "<",
            Predicate::Gt(_) => ">",
            Predicate::LtEq(_) => "<=",
            Predicate::GtEq(_) => ">=",
            Predicate::Between(..) => "between",
            Predicate::NotBetween(..) => "not between",
            Predicate::In(_) => "in",
            Predicate::NotIn(_) => "not in",
            Predicate::Contains(_) => "contains",
            Predicate::NotContains(_) => "not contains",
            Predicate::StartsWith(_) => "starts with",
            Predicate::NotStartsWith(_) => "not starts with",
            Predicate::EndsWith(_) => "ends with",
            Predicate::NotEndsWith(_) => "not ends with",
            Predicate::Regex(_) => "~",
            Predicate::NotRegex(_) => "!~",
            Predicate::IsNull => "is null",
            Predicate::IsEmpty => "is empty",
            Predicate::IsNaN => "is nan",
            Predicate::Not(_) => "not",
            Predicate::And(_) => "and",
            Predicate::Or(_) => "or",
        }
    }
}

/// Kleene conjunction over three-valued results.
pub(crate) fn and3(results: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut unknown = false;
    for result in results {
        match result {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(true)
    }
}

/// Kleene disjunction over three-valued results.
pub(crate) fn or3(results: impl IntoIterator<Item = Option<bool>>) -> Option<bool> {
    let mut unknown = false;
    for result in results {
        match result {
            Some(true) => return Some(true),
            None => unknown = true,
            Some(false) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(false)
    }
}
