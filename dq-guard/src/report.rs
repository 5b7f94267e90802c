//! The analysis report and its JSON form.
//!
//! A report is an array with one object per configured column:
//!
//! ```json
//! [
//!   {
//!     "col_name": "amount",
//!     "total_count": 4,
//!     "null_count": 1,
//!     "unique_count": 3,
//!     "topn_values": {"5.0": 2, "9.0": 1},
//!     "min": 5.0, "max": 9.0, "mean": 6.33, "stddev": 2.31,
//!     "quality_score": 0.0,
//!     "constraints": [
//!       {"name": "lt", "values": 8, "constraint_status": "failed",
//!        "invalid_count": 1, "invalid_values": [9.0]}
//!     ]
//!   }
//! ]
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::constraints::ConstraintResult;
use crate::error::Result;
use crate::profiler::NumericSummary;
use crate::value::Value;

/// Most frequent values with their counts, most frequent first.
///
/// Serializes as a JSON object whose key order is the ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopValues(Vec<(String, u64)>);

impl TopValues {
    pub fn get(&self, value: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(key, _)| key == value)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(Value, u64)>> for TopValues {
    fn from(counts: Vec<(Value, u64)>) -> Self {
        Self(
            counts
                .into_iter()
                .map(|(value, count)| (value.to_string(), count))
                .collect(),
        )
    }
}

impl Serialize for TopValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Profile and constraint outcomes of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub col_name: String,
    pub total_count: u64,
    pub null_count: u64,
    pub unique_count: u64,
    pub topn_values: TopValues,
    /// Present for numeric columns only.
    #[serde(flatten)]
    pub numeric: Option<NumericSummary>,
    /// Reserved; always 0.
    pub quality_score: f64,
    pub constraints: Vec<ConstraintResult>,
}

impl ColumnReport {
    pub fn constraint(&self, name: &str) -> Option<&ConstraintResult> {
        self.constraints.iter().find(|result| result.name == name)
    }

    pub fn failed_constraints(&self) -> impl Iterator<Item = &ConstraintResult> {
        self.constraints
            .iter()
            .filter(|result| result.constraint_status.is_failed())
    }
}

/// Column reports in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisReport {
    columns: Vec<ColumnReport>,
}

impl AnalysisReport {
    pub fn new(columns: Vec<ColumnReport>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnReport] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|column| column.col_name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when no constraint on any column failed.
    pub fn all_passed(&self) -> bool {
        self.columns
            .iter()
            .all(|column| column.failed_constraints().next().is_none())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_columns(self) -> Vec<ColumnReport> {
        self.columns
    }
}

impl IntoIterator for AnalysisReport {
    type Item = ColumnReport;
    type IntoIter = std::vec::IntoIter<ColumnReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}
