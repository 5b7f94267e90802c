//! # dq-guard - declarative column quality analysis
//!
//! dq-guard checks tabular data against a per-column configuration of named
//! rules and reports, for each column, how many and which rows violate each
//! rule together with descriptive statistics: counts, distinct values, the
//! most frequent values and, for numeric columns, min/max/mean/stddev.
//!
//! The same configuration runs unmodified against an in-process
//! [`MemoryTable`](sources::MemoryTable) and against a table registered in a
//! DataFusion session ([`DataFusionSource`](sources::DataFusionSource)).
//!
//! ## Quick Start
//!
//! ```rust
//! use dq_guard::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let columns = ColumnConfig::list_from_json_str(
//!     r#"[
//!         {"name": "qty", "datatype": "integer",
//!          "constraints": [{"name": "between", "values": [1, 10]}]},
//!         {"name": "sku", "datatype": "string",
//!          "constraints": [{"name": "regex", "values": "[A-Z]{3}-\\d+"}]}
//!     ]"#,
//! )?;
//!
//! let table = MemoryTable::new()
//!     .with_column("qty", vec![3, 12, 7])
//!     .with_column("sku", vec!["ABC-1", "abc-2", "XYZ-30"]);
//!
//! let report = Analyzer::new().analyze(&table, &columns).await?;
//! let qty = report.column("qty").unwrap();
//! assert_eq!(qty.constraints[0].invalid_count, 1);
//! assert_eq!(qty.constraints[0].invalid_values, vec![Value::Integer(12)]);
//!
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Rules
//!
//! | Family | Rules |
//! |--------|-------|
//! | numeric (`number`, `integer`) | `eq`, `not_eq`, `lt`, `gt`, `lt_eq`, `gt_eq`, `between`, `not_between`, `is_in`, `not_in` |
//! | string (`string`) | `eq`, `not_eq`, `contains`, `not_contains`, `starts_with`, `not_starts_with`, `ends_with`, `not_ends_with`, `is_in`, `not_in`, `regex` |
//!
//! A rule is evaluated by selecting the rows that violate it. Null cells never
//! violate a rule; they are reported through `null_count` instead.
//!
//! ## Architecture
//!
//! - **`sources`**: the [`TabularSource`](sources::TabularSource) trait and its
//!   in-memory and DataFusion backends
//! - **`predicate`**: backend-neutral row predicates
//! - **`constraints`**: rule vocabularies, the registry and rule execution
//! - **`profiler`**: per-column statistics and orchestration
//! - **`analyzer`**: the top-level entry point
//! - **`report`** / **`formatters`**: output model, JSON and text rendering
//!
//! ## Logging
//!
//! dq-guard emits `tracing` events and never installs a subscriber itself. See
//! [`logging::setup::init_logging`] for an opt-in helper.

pub mod analyzer;
pub mod config;
pub mod constraints;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod predicate;
pub mod prelude;
pub mod profiler;
pub mod report;
pub mod security;
pub mod sources;
pub mod value;

#[cfg(test)]
pub(crate) mod test_fixtures;
