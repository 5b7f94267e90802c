//! Prelude for commonly used types and traits in dq-guard.

pub use crate::analyzer::Analyzer;
pub use crate::config::{AnalyzerConfig, ColumnConfig, Datatype, RuleFamily, RuleSpec};
pub use crate::constraints::{Constraint, ConstraintResult, ConstraintStatus};
pub use crate::error::{ErrorContext, QualityError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::report::{AnalysisReport, ColumnReport};
pub use crate::sources::{DataFusionSource, MemoryTable, TabularSource};
pub use crate::value::Value;
