//! Table backends the analysis engine runs against.
//!
//! The engine never inspects a backend directly. It drives a
//! [`TabularSource`] through a small set of column operations, so one rule
//! set runs unmodified against an in-process [`MemoryTable`] and a table
//! registered in a DataFusion session ([`DataFusionSource`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use dq_guard::prelude::*;
//! use datafusion::prelude::SessionContext;
//!
//! # async fn example() -> Result<()> {
//! let ctx = SessionContext::new();
//! ctx.register_csv("orders", "data/orders.csv", Default::default()).await?;
//!
//! let source = DataFusionSource::new(ctx, "orders")?;
//! let column = source.select_column("amount").await?;
//! let rows = source.count(&column).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;

use async_trait::async_trait;

use crate::config::Datatype;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::value::Value;

mod memory;
mod sql;

pub use memory::{MemoryColumn, MemoryTable};
pub use sql::{DataFusionSource, SqlColumn};

/// Numeric aggregates computed over the non-null, non-NaN values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Mean,
    /// Sample standard deviation, undefined below two values.
    StdDev,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Mean => "mean",
            Aggregate::StdDev => "stddev",
        }
    }
}

/// A table the engine can analyze.
///
/// A `Column` is an opaque handle to one column's data, possibly cast and
/// narrowed by filters. Handles are cheap to clone and never mutate the
/// underlying table.
///
/// Filters follow SQL three-valued logic: a row is kept only when the
/// predicate is definitely true, so a null cell never passes a comparison.
#[async_trait]
pub trait TabularSource: Debug + Send + Sync {
    type Column: Clone + Debug + Send + Sync;

    /// Human-readable description, used in logs.
    fn description(&self) -> String;

    /// Returns a handle to the named column, or `ColumnNotFound`.
    async fn select_column(&self, name: &str) -> Result<Self::Column>;

    /// Coerces the column to `datatype`. Cells that cannot be converted
    /// become null.
    async fn cast(&self, column: &Self::Column, datatype: &Datatype) -> Result<Self::Column>;

    /// Number of rows, nulls included.
    async fn count(&self, column: &Self::Column) -> Result<u64>;

    /// Rows for which `predicate` is true.
    async fn filter(&self, column: &Self::Column, predicate: &Predicate) -> Result<Self::Column>;

    /// Number of distinct non-null values.
    async fn distinct_count(&self, column: &Self::Column) -> Result<u64>;

    /// The `n` most frequent non-null values with their counts, by descending
    /// count. Ties are ordered by ascending value.
    async fn group_count_top(&self, column: &Self::Column, n: usize)
        -> Result<Vec<(Value, u64)>>;

    /// Computes `aggregate`; `None` when the column has no usable values.
    async fn aggregate(&self, column: &Self::Column, aggregate: Aggregate) -> Result<Option<f64>>;

    /// Up to `n` values in the column's natural order.
    async fn sample(&self, column: &Self::Column, n: usize) -> Result<Vec<Value>>;
}
