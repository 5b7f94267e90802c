//! Rule vocabularies and their failure predicates.
//!
//! Each rule is checked by selecting the rows that do **not** satisfy it, so
//! every rule maps to the complement of its passing condition.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::predicate::Predicate;
use crate::security::SqlSecurity;
use crate::value::Value;

/// Rules available to `number` and `integer` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericRule {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Between,
    NotBetween,
    IsIn,
    NotIn,
}

impl NumericRule {
    pub const ALL: [NumericRule; 10] = [
        NumericRule::Eq,
        NumericRule::NotEq,
        NumericRule::Lt,
        NumericRule::Gt,
        NumericRule::LtEq,
        NumericRule::GtEq,
        NumericRule::Between,
        NumericRule::NotBetween,
        NumericRule::IsIn,
        NumericRule::NotIn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericRule::Eq => "eq",
            NumericRule::NotEq => "not_eq",
            NumericRule::Lt => "lt",
            NumericRule::Gt => "gt",
            NumericRule::LtEq => "lt_eq",
            NumericRule::GtEq => "gt_eq",
            NumericRule::Between => "between",
            NumericRule::NotBetween => "not_between",
            NumericRule::IsIn => "is_in",
            NumericRule::NotIn => "not_in",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    fn failure_predicate(&self, values: &JsonValue) -> Result<Predicate, String> {
        let predicate = match self {
            NumericRule::Eq => Predicate::NotEq(number(values)?),
            NumericRule::NotEq => Predicate::Eq(number(values)?),
            NumericRule::Lt => Predicate::GtEq(number(values)?),
            NumericRule::Gt => Predicate::LtEq(number(values)?),
            NumericRule::LtEq => Predicate::Gt(number(values)?),
            NumericRule::GtEq => Predicate::Lt(number(values)?),
            NumericRule::Between => {
                let (low, high) = number_bounds(values)?;
                Predicate::NotBetween(low, high)
            }
            NumericRule::NotBetween => {
                let (low, high) = number_bounds(values)?;
                Predicate::Between(low, high)
            }
            NumericRule::IsIn => Predicate::NotIn(number_list(values)?),
            NumericRule::NotIn => Predicate::In(number_list(values)?),
        };
        Ok(predicate)
    }
}

/// Rules available to `string` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringRule {
    Eq,
    NotEq,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    IsIn,
    NotIn,
    Regex,
}

impl StringRule {
    pub const ALL: [StringRule; 11] = [
        StringRule::Eq,
        StringRule::NotEq,
        StringRule::Contains,
        StringRule::NotContains,
        StringRule::StartsWith,
        StringRule::NotStartsWith,
        StringRule::EndsWith,
        StringRule::NotEndsWith,
        StringRule::IsIn,
        StringRule::NotIn,
        StringRule::Regex,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StringRule::Eq => "eq",
            StringRule::NotEq => "not_eq",
            StringRule::Contains => "contains",
            StringRule::NotContains => "not_contains",
            StringRule::StartsWith => "starts_with",
            StringRule::NotStartsWith => "not_starts_with",
            StringRule::EndsWith => "ends_with",
            StringRule::NotEndsWith => "not_ends_with",
            StringRule::IsIn => "is_in",
            StringRule::NotIn => "not_in",
            StringRule::Regex => "regex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    fn failure_predicate(&self, values: &JsonValue) -> Result<Predicate, String> {
        let predicate = match self {
            StringRule::Eq => Predicate::NotEq(Value::Text(text(values)?)),
            StringRule::NotEq => Predicate::Eq(Value::Text(text(values)?)),
            StringRule::Contains => Predicate::NotContains(text(values)?),
            StringRule::NotContains => Predicate::Contains(text(values)?),
            StringRule::StartsWith => Predicate::NotStartsWith(text(values)?),
            StringRule::NotStartsWith => Predicate::StartsWith(text(values)?),
            StringRule::EndsWith => Predicate::NotEndsWith(text(values)?),
            StringRule::NotEndsWith => Predicate::EndsWith(text(values)?),
            StringRule::IsIn => Predicate::NotIn(text_list(values)?),
            StringRule::NotIn => Predicate::In(text_list(values)?),
            StringRule::Regex => Predicate::NotRegex(full_match_pattern(values)?),
        };
        Ok(predicate)
    }
}

/// A resolved rule of either family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Numeric(NumericRule),
    String(StringRule),
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Numeric(rule) => rule.name(),
            RuleKind::String(rule) => rule.name(),
        }
    }

    /// Binds `values` and returns the predicate selecting violating rows.
    ///
    /// The error is a description of what was wrong with `values`.
    pub fn failure_predicate(&self, values: &JsonValue) -> Result<Predicate, String> {
        match self {
            RuleKind::Numeric(rule) => rule.failure_predicate(values),
            RuleKind::String(rule) => rule.failure_predicate(values),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn number(values: &JsonValue) -> Result<Value, String> {
    match values {
        JsonValue::Number(n) => Ok(n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Number))
            .unwrap_or(Value::Null)),
        other => Err(format!("expected a number, got {other}")),
    }
}

fn number_bounds(values: &JsonValue) -> Result<(Value, Value), String> {
    match values.as_array().map(Vec::as_slice) {
        Some([low, high]) => Ok((number(low)?, number(high)?)),
        _ => Err(format!(
            "expected an array of two numbers [lower, upper], got {values}"
        )),
    }
}

fn number_list(values: &JsonValue) -> Result<Vec<Value>, String> {
    values
        .as_array()
        .ok_or_else(|| format!("expected an array of numbers, got {values}"))?
        .iter()
        .map(number)
        .collect()
}

fn text(values: &JsonValue) -> Result<String, String> {
    match values {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {other}")),
    }
}

fn text_list(values: &JsonValue) -> Result<Vec<Value>, String> {
    values
        .as_array()
        .ok_or_else(|| format!("expected an array of strings, got {values}"))?
        .iter()
        .map(|value| text(value).map(Value::Text))
        .collect()
}

/// Anchors the pattern so it must match the whole value.
fn full_match_pattern(values: &JsonValue) -> Result<String, String> {
    let JsonValue::String(pattern) = values else {
        return Err(format!("expected a regex pattern string, got {values}"));
    };
    let anchored = format!("^(?:{pattern})$");
    SqlSecurity::validate_regex_pattern(&anchored).map_err(|e| e.to_string())?;
    Ok(anchored)
}
