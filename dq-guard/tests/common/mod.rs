//! Shared helpers for integration tests: the same column loaded into both
//! backends.

#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use dq_guard::prelude::*;

/// Name of the single column every helper batch carries.
pub const COLUMN: &str = "c";

pub fn batch_of(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

pub fn int_batch(values: Vec<Option<i64>>) -> RecordBatch {
    batch_of(vec![(COLUMN, Arc::new(Int64Array::from(values)) as ArrayRef)])
}

pub fn float_batch(values: Vec<Option<f64>>) -> RecordBatch {
    batch_of(vec![(COLUMN, Arc::new(Float64Array::from(values)) as ArrayRef)])
}

pub fn string_batch(values: Vec<Option<&str>>) -> RecordBatch {
    batch_of(vec![(COLUMN, Arc::new(StringArray::from(values)) as ArrayRef)])
}

/// The batch as both an in-memory table and a DataFusion table named `data`.
pub struct Backends {
    pub memory: MemoryTable,
    pub sql: DataFusionSource,
}

impl Backends {
    pub fn new(batch: RecordBatch) -> Self {
        Self {
            memory: MemoryTable::from_record_batch(&batch).unwrap(),
            sql: DataFusionSource::from_record_batch("data", batch).unwrap(),
        }
    }

    /// Analyzes with both backends and returns `(memory, sql)` reports.
    pub async fn analyze(
        &self,
        columns: &[ColumnConfig],
    ) -> (Result<AnalysisReport>, Result<AnalysisReport>) {
        let analyzer = Analyzer::new();
        (
            analyzer.analyze(&self.memory, columns).await,
            analyzer.analyze(&self.sql, columns).await,
        )
    }

    /// Runs one rule on column `c` with both backends and checks that they
    /// agree on status and count. Returns the in-memory result.
    pub async fn check_rule(
        &self,
        datatype: &str,
        rule: &str,
        values: serde_json::Value,
    ) -> ConstraintResult {
        let columns = vec![ColumnConfig::new(COLUMN, datatype).rule(rule, values)];
        let (memory, sql) = self.analyze(&columns).await;
        let memory = memory.unwrap().into_columns().remove(0).constraints.remove(0);
        let sql = sql.unwrap().into_columns().remove(0).constraints.remove(0);

        assert_eq!(memory.constraint_status, sql.constraint_status, "rule {rule}");
        assert_eq!(memory.invalid_count, sql.invalid_count, "rule {rule}");
        assert_eq!(
            memory.invalid_values.len(),
            sql.invalid_values.len(),
            "rule {rule}"
        );
        memory
    }
}

/// Asserts the result invariants every constraint outcome must satisfy.
pub fn assert_result_invariants(result: &ConstraintResult) {
    assert_eq!(
        result.constraint_status.is_failed(),
        result.invalid_count > 0,
        "status must be failed exactly when rows are invalid"
    );
    assert_eq!(
        result.invalid_values.len() as u64,
        result.invalid_count.min(10),
        "sample must hold min(count, 10) values"
    );
}
