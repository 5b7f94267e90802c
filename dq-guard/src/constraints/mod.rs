//! Constraints: one configured rule bound to one column.
//!
//! A [`Constraint`] is checked by filtering its column down to the rows that
//! violate it. The size of that subset decides the status and a bounded
//! sample of it is reported back.
//!
//! # Examples
//!
//! ```rust
//! use dq_guard::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let table = MemoryTable::new().with_column("qty", vec![5, 1]);
//! let column = table.select_column("qty").await?;
//!
//! let constraint = Constraint::new(&RuleSpec::new("eq", 5), "qty", RuleFamily::Numeric)?;
//! let result = constraint.execute(&table, &column).await?;
//!
//! assert_eq!(result.constraint_status, ConstraintStatus::Failed);
//! assert_eq!(result.invalid_count, 1);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{RuleFamily, RuleSpec, DEFAULT_SAMPLE_LIMIT};
use crate::error::{QualityError, Result};
use crate::predicate::Predicate;
use crate::sources::TabularSource;
use crate::value::Value;

pub mod registry;
pub mod rules;

pub use registry::ConstraintRegistry;
pub use rules::{NumericRule, RuleKind, StringRule};

/// Keys of a result that configuration extras may not overwrite.
const RESULT_KEYS: [&str; 5] = [
    "name",
    "values",
    "constraint_status",
    "invalid_count",
    "invalid_values",
];

/// Outcome of a constraint check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintStatus {
    /// No row violates the rule
    Success,
    /// At least one row violates the rule
    Failed,
}

impl ConstraintStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ConstraintStatus::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ConstraintStatus::Failed)
    }
}

/// The configured rule echoed back with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintResult {
    pub name: String,
    pub values: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub constraint_status: ConstraintStatus,
    pub invalid_count: u64,
    pub invalid_values: Vec<Value>,
}

/// One rule bound to one column.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    values: serde_json::Value,
    extra: serde_json::Map<String, serde_json::Value>,
    column_name: String,
    rule: RuleKind,
    sample_limit: usize,
}

impl Constraint {
    /// Resolves `spec` in `family` and binds it to `column_name`.
    ///
    /// Fails with `UnsupportedRule` for an unknown rule name. `values` are not
    /// inspected until the constraint runs.
    pub fn new(spec: &RuleSpec, column_name: impl Into<String>, family: RuleFamily) -> Result<Self> {
        let rule = ConstraintRegistry::resolve(&spec.name, family)?;
        let extra = spec
            .extra
            .iter()
            .filter(|(key, _)| !RESULT_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            name: spec.name.clone(),
            values: spec.values.clone(),
            extra,
            column_name: column_name.into(),
            rule,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        })
    }

    /// Caps the number of invalid values reported. Clamped to at least one so
    /// a failed result always carries a sample.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn rule(&self) -> RuleKind {
        self.rule
    }

    pub fn values(&self) -> &serde_json::Value {
        &self.values
    }

    /// The predicate selecting rows that violate the rule.
    pub fn failure_predicate(&self) -> Result<Predicate> {
        self.rule
            .failure_predicate(&self.values)
            .map_err(|message| QualityError::malformed_values(&self.name, &self.column_name, message))
    }

    /// Narrows `column` to its violating rows.
    pub async fn failure_subset<S: TabularSource>(
        &self,
        source: &S,
        column: &S::Column,
    ) -> Result<S::Column> {
        let predicate = self.failure_predicate()?;
        source.filter(column, &predicate).await
    }

    /// Up to the sample limit of values from a failure subset, in its order.
    pub async fn sample_invalid_values<S: TabularSource>(
        &self,
        source: &S,
        subset: &S::Column,
    ) -> Result<Vec<Value>> {
        source.sample(subset, self.sample_limit).await
    }

    /// Checks the rule against `column`.
    #[instrument(skip(self, source, column), fields(rule = %self.name, column = %self.column_name))]
    pub async fn execute<S: TabularSource>(
        &self,
        source: &S,
        column: &S::Column,
    ) -> Result<ConstraintResult> {
        let subset = self.failure_subset(source, column).await?;
        let invalid_count = source.count(&subset).await?;
        let invalid_values = if invalid_count == 0 {
            Vec::new()
        } else {
            self.sample_invalid_values(source, &subset).await?
        };

        let constraint_status = if invalid_count > 0 {
            ConstraintStatus::Failed
        } else {
            ConstraintStatus::Success
        };
        debug!(invalid_count, status = ?constraint_status, "Constraint evaluated");

        Ok(ConstraintResult {
            name: self.name.clone(),
            values: self.values.clone(),
            extra: self.extra.clone(),
            constraint_status,
            invalid_count,
            invalid_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemoryTable;
    use serde_json::json;

    async fn run(spec: RuleSpec, family: RuleFamily, table: &MemoryTable) -> Result<ConstraintResult> {
        let column = table.select_column("c").await?;
        Constraint::new(&spec, "c", family)?.execute(table, &column).await
    }

    #[tokio::test]
    async fn test_eq_failure() {
        let table = MemoryTable::new().with_column("c", vec![5, 1]);
        let result = run(RuleSpec::new("eq", 5), RuleFamily::Numeric, &table)
            .await
            .unwrap();
        assert_eq!(result.constraint_status, ConstraintStatus::Failed);
        assert_eq!(result.invalid_count, 1);
        assert_eq!(result.invalid_values, vec![Value::Integer(1)]);
    }

    #[tokio::test]
    async fn test_success_has_empty_sample() {
        let table = MemoryTable::new().with_column("c", vec![Some(5.0), Some(7.0), None]);
        let result = run(RuleSpec::new("between", json!([5, 7])), RuleFamily::Numeric, &table)
            .await
            .unwrap();
        assert!(result.constraint_status.is_success());
        assert_eq!(result.invalid_count, 0);
        assert!(result.invalid_values.is_empty());
    }

    #[tokio::test]
    async fn test_sample_is_capped() {
        let table = MemoryTable::new().with_column("c", (0..25).collect::<Vec<i64>>());
        let column = table.select_column("c").await.unwrap();
        let constraint = Constraint::new(&RuleSpec::new("lt", 0), "c", RuleFamily::Numeric)
            .unwrap()
            .with_sample_limit(3);
        let result = constraint.execute(&table, &column).await.unwrap();
        assert_eq!(result.invalid_count, 25);
        assert_eq!(
            result.invalid_values,
            vec![Value::Integer(0), Value::Integer(1), Value::Integer(2)]
        );
    }

    #[tokio::test]
    async fn test_zero_sample_limit_still_samples() {
        let table = MemoryTable::new().with_column("c", vec![4, 9, 12]);
        let column = table.select_column("c").await.unwrap();
        let constraint = Constraint::new(&RuleSpec::new("lt", 5), "c", RuleFamily::Numeric)
            .unwrap()
            .with_sample_limit(0);
        let result = constraint.execute(&table, &column).await.unwrap();
        assert_eq!(result.invalid_count, 2);
        assert_eq!(result.invalid_values, vec![Value::Integer(9)]);
    }

    #[tokio::test]
    async fn test_malformed_values_raised_at_execution() {
        let table = MemoryTable::new().with_column("c", vec![1]);
        let constraint =
            Constraint::new(&RuleSpec::new("between", 3), "c", RuleFamily::Numeric).unwrap();
        let column = table.select_column("c").await.unwrap();
        let err = constraint.execute(&table, &column).await.unwrap_err();
        assert!(matches!(
            err,
            QualityError::MalformedConstraintValues { ref rule, ref column, .. }
                if rule == "between" && column == "c"
        ));
    }

    #[test]
    fn test_unknown_rule_rejected_at_construction() {
        let err = Constraint::new(&RuleSpec::new("regex", "x"), "c", RuleFamily::Numeric)
            .unwrap_err();
        assert!(matches!(err, QualityError::UnsupportedRule { .. }));
    }

    #[test]
    fn test_result_serialization_echoes_extra_keys() {
        let mut spec = RuleSpec::new("eq", "x");
        spec.extra.insert("severity".into(), json!("high"));
        spec.extra.insert("invalid_count".into(), json!(99));

        let result = ConstraintResult {
            name: spec.name.clone(),
            values: spec.values.clone(),
            extra: Constraint::new(&spec, "c", RuleFamily::String).unwrap().extra,
            constraint_status: ConstraintStatus::Failed,
            invalid_count: 2,
            invalid_values: vec![Value::from("y"), Value::from("z")],
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "name": "eq",
                "values": "x",
                "severity": "high",
                "constraint_status": "failed",
                "invalid_count": 2,
                "invalid_values": ["y", "z"]
            })
        );
    }
}
