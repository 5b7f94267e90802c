//! In-process table backend.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use super::{Aggregate, TabularSource};
use crate::config::Datatype;
use crate::error::{QualityError, Result};
use crate::predicate::{and3, or3, Predicate};
use crate::profiler::statistics::RunningMoments;
use crate::security::SqlSecurity;
use crate::value::{GroupKey, Value};

/// An immutable table of named columns held in memory.
///
/// Columns are stored independently; every operation works on a single
/// column, so the table needs no row alignment beyond what the caller
/// provides.
///
/// # Examples
///
/// ```rust
/// use dq_guard::sources::MemoryTable;
/// use dq_guard::value::Value;
///
/// let table = MemoryTable::new()
///     .with_column("city", vec![Value::from("Oslo"), Value::Null])
///     .with_column("qty", vec![3, 4]);
/// assert_eq!(table.column_names(), vec!["city", "qty"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<(String, Arc<Vec<Value>>)>,
}

/// Handle to one column of a [`MemoryTable`].
#[derive(Debug, Clone)]
pub struct MemoryColumn {
    name: String,
    values: Arc<Vec<Value>>,
}

impl MemoryColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, replacing any column with the same name.
    pub fn with_column<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let name = name.into();
        let values = Arc::new(values.into_iter().map(Into::into).collect::<Vec<_>>());
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = values,
            None => self.columns.push((name, values)),
        }
        self
    }

    /// Copies an Arrow record batch into memory.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        Self::from_record_batches(std::slice::from_ref(batch))
    }

    /// Copies record batches sharing one schema into memory, in order.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Ok(Self::new());
        };
        let schema = first.schema();

        let mut columns: Vec<(String, Vec<Value>)> = schema
            .fields()
            .iter()
            .map(|field| (field.name().clone(), Vec::new()))
            .collect();

        for batch in batches {
            if batch.schema().fields() != schema.fields() {
                return Err(QualityError::Configuration(
                    "Record batches must share one schema".to_string(),
                ));
            }
            for (index, (_, values)) in columns.iter_mut().enumerate() {
                let array = batch.column(index);
                values.reserve(array.len());
                for row in 0..array.len() {
                    values.push(Value::from_arrow(array.as_ref(), row)?);
                }
            }
        }

        Ok(Self {
            columns: columns
                .into_iter()
                .map(|(name, values)| (name, Arc::new(values)))
                .collect(),
        })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of rows in the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TabularSource for MemoryTable {
    type Column = MemoryColumn;

    fn description(&self) -> String {
        format!(
            "in-memory table ({} columns, {} rows)",
            self.columns.len(),
            self.num_rows()
        )
    }

    async fn select_column(&self, name: &str) -> Result<MemoryColumn> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(column, values)| MemoryColumn {
                name: column.clone(),
                values: Arc::clone(values),
            })
            .ok_or_else(|| QualityError::column_not_found(name))
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn cast(&self, column: &MemoryColumn, datatype: &Datatype) -> Result<MemoryColumn> {
        let convert: fn(&Value) -> Value = match datatype {
            Datatype::String => cast_to_string,
            Datatype::Number => cast_to_number,
            Datatype::Integer => cast_to_integer,
            Datatype::Unsupported(name) => {
                return Err(QualityError::UnsupportedDatatype {
                    datatype: name.clone(),
                })
            }
        };

        Ok(MemoryColumn {
            name: column.name.clone(),
            values: Arc::new(column.values.iter().map(convert).collect()),
        })
    }

    async fn count(&self, column: &MemoryColumn) -> Result<u64> {
        Ok(column.values.len() as u64)
    }

    #[instrument(skip(self, column, predicate), fields(column = %column.name, predicate = predicate.label()))]
    async fn filter(&self, column: &MemoryColumn, predicate: &Predicate) -> Result<MemoryColumn> {
        let compiled = CompiledPredicate::compile(predicate)?;
        let kept: Vec<Value> = column
            .values
            .iter()
            .filter(|value| compiled.eval(value) == Some(true))
            .cloned()
            .collect();

        debug!(kept = kept.len(), total = column.values.len(), "Filtered column");
        Ok(MemoryColumn {
            name: column.name.clone(),
            values: Arc::new(kept),
        })
    }

    async fn distinct_count(&self, column: &MemoryColumn) -> Result<u64> {
        let distinct: HashSet<GroupKey> =
            column.values.iter().filter_map(Value::group_key).collect();
        Ok(distinct.len() as u64)
    }

    async fn group_count_top(&self, column: &MemoryColumn, n: usize) -> Result<Vec<(Value, u64)>> {
        let mut groups: HashMap<GroupKey, (Value, u64)> = HashMap::new();
        for value in column.values.iter() {
            if let Some(key) = value.group_key() {
                groups.entry(key).or_insert_with(|| (value.clone(), 0)).1 += 1;
            }
        }

        let mut counts: Vec<(Value, u64)> = groups.into_values().collect();
        counts.sort_by(|(a_value, a_count), (b_value, b_count)| {
            b_count
                .cmp(a_count)
                .then_with(|| a_value.compare(b_value).unwrap_or(Ordering::Equal))
        });
        counts.truncate(n);
        Ok(counts)
    }

    async fn aggregate(&self, column: &MemoryColumn, aggregate: Aggregate) -> Result<Option<f64>> {
        let numbers = column
            .values
            .iter()
            .filter_map(Value::as_f64)
            .filter(|n| !n.is_nan());

        let result = match aggregate {
            Aggregate::Min => numbers.reduce(f64::min),
            Aggregate::Max => numbers.reduce(f64::max),
            Aggregate::Mean => RunningMoments::from_iter(numbers).mean(),
            Aggregate::StdDev => RunningMoments::from_iter(numbers).sample_stddev(),
        };
        Ok(result)
    }

    async fn sample(&self, column: &MemoryColumn, n: usize) -> Result<Vec<Value>> {
        Ok(column.values.iter().take(n).cloned().collect())
    }
}

fn cast_to_string(value: &Value) -> Value {
    value.render().map(Value::Text).unwrap_or(Value::Null)
}

fn cast_to_number(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Number(*i as f64),
        Value::Number(n) => Value::Number(*n),
        Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Null => Value::Null,
    }
}

fn cast_to_integer(value: &Value) -> Value {
    match value {
        Value::Integer(i) => Value::Integer(*i),
        Value::Number(n) if n.is_finite() && n.abs() < i64::MAX as f64 => {
            Value::Integer(n.trunc() as i64)
        }
        Value::Bool(b) => Value::Integer(i64::from(*b)),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or(Value::Null),
        Value::Number(_) | Value::Null => Value::Null,
    }
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl Comparison {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::NotEq => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::LtEq => ordering != Ordering::Greater,
            Comparison::GtEq => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TextTest {
    Contains,
    StartsWith,
    EndsWith,
}

/// A [`Predicate`] with its regexes compiled, evaluated row by row.
#[derive(Debug)]
enum CompiledPredicate {
    Compare(Comparison, Value),
    Between(Value, Value),
    In(Vec<Value>),
    Text(TextTest, String),
    Regex(Regex),
    IsNull,
    IsEmpty,
    IsNaN,
    Not(Box<CompiledPredicate>),
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    fn compile(predicate: &Predicate) -> Result<Self> {
        use CompiledPredicate as C;

        let negate = |inner: C| C::Not(Box::new(inner));
        let compiled = match predicate {
            Predicate::Eq(v) => C::Compare(Comparison::Eq, v.clone()),
            Predicate::NotEq(v) => C::Compare(Comparison::NotEq, v.clone()),
            Predicate::Lt(v) => C::Compare(Comparison::Lt, v.clone()),
            Predicate::Gt(v) => C::Compare(Comparison::Gt, v.clone()),
            Predicate::LtEq(v) => C::Compare(Comparison::LtEq, v.clone()),
            Predicate::GtEq(v) => C::Compare(Comparison::GtEq, v.clone()),
            Predicate::Between(low, high) => C::Between(low.clone(), high.clone()),
            Predicate::NotBetween(low, high) => negate(C::Between(low.clone(), high.clone())),
            Predicate::In(values) => C::In(values.clone()),
            Predicate::NotIn(values) => negate(C::In(values.clone())),
            Predicate::Contains(s) => C::Text(TextTest::Contains, s.clone()),
            Predicate::NotContains(s) => negate(C::Text(TextTest::Contains, s.clone())),
            Predicate::StartsWith(s) => C::Text(TextTest::StartsWith, s.clone()),
            Predicate::NotStartsWith(s) => negate(C::Text(TextTest::StartsWith, s.clone())),
            Predicate::EndsWith(s) => C::Text(TextTest::EndsWith, s.clone()),
            Predicate::NotEndsWith(s) => negate(C::Text(TextTest::EndsWith, s.clone())),
            Predicate::Regex(pattern) => C::Regex(SqlSecurity::validate_regex_pattern(pattern)?),
            Predicate::NotRegex(pattern) => {
                negate(C::Regex(SqlSecurity::validate_regex_pattern(pattern)?))
            }
            Predicate::IsNull => C::IsNull,
            Predicate::IsEmpty => C::IsEmpty,
            Predicate::IsNaN => C::IsNaN,
            Predicate::Not(inner) => negate(Self::compile(inner)?),
            Predicate::And(parts) => C::And(parts.iter().map(Self::compile).collect::<Result<_>>()?),
            Predicate::Or(parts) => C::Or(parts.iter().map(Self::compile).collect::<Result<_>>()?),
        };
        Ok(compiled)
    }

    /// Three-valued evaluation: `None` is unknown.
    fn eval(&self, value: &Value) -> Option<bool> {
        use CompiledPredicate as C;

        match self {
            C::IsNull => Some(value.is_null()),
            C::Not(inner) => inner.eval(value).map(|b| !b),
            C::And(parts) => and3(parts.iter().map(|p| p.eval(value))),
            C::Or(parts) => or3(parts.iter().map(|p| p.eval(value))),
            _ if value.is_null() => None,
            C::Compare(op, literal) => compare(op, value, literal),
            C::Between(low, high) => and3([
                compare(&Comparison::GtEq, value, low),
                compare(&Comparison::LtEq, value, high),
            ]),
            C::In(candidates) => or3(
                candidates
                    .iter()
                    .map(|candidate| compare(&Comparison::Eq, value, candidate)),
            ),
            C::Text(test, needle) => {
                let text = value.render()?;
                Some(match test {
                    TextTest::Contains => text.contains(needle.as_str()),
                    TextTest::StartsWith => text.starts_with(needle.as_str()),
                    TextTest::EndsWith => text.ends_with(needle.as_str()),
                })
            }
            C::Regex(regex) => value.render().map(|text| regex.is_match(&text)),
            C::IsEmpty => Some(value.as_text().is_some_and(str::is_empty)),
            C::IsNaN => Some(match value {
                Value::Number(n) => n.is_nan(),
                Value::Text(s) => s.eq_ignore_ascii_case("nan"),
                _ => false,
            }),
        }
    }
}

fn compare(op: &Comparison, value: &Value, literal: &Value) -> Option<bool> {
    value.compare(literal).map(|ordering| op.holds(ordering))
}
