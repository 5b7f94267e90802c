//! Rendering of analysis reports for people and tools.
//!
//! The canonical output is the JSON array produced by
//! [`AnalysisReport::to_json`]. The formatters here add a pretty/compact JSON
//! switch, a console summary and a Markdown document.
//!
//! # Examples
//!
//! ```rust
//! use dq_guard::formatters::{HumanFormatter, ReportFormatter};
//! use dq_guard::report::AnalysisReport;
//!
//! let report = AnalysisReport::default();
//! let text = HumanFormatter::new().format(&report).unwrap();
//! assert!(text.contains("0 columns"));
//! ```

use std::fmt::Write;

use crate::constraints::ConstraintResult;
use crate::error::{QualityError, Result};
use crate::report::{AnalysisReport, ColumnReport};
use crate::value::Value;

/// Options shared by all formatters.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the top-N frequency table of each column
    pub include_top_values: bool,
    /// Include sampled invalid values of failed constraints
    pub include_invalid_values: bool,
    /// Include constraints that passed
    pub include_passed_constraints: bool,
    /// Whether to use colorized output (human formatter only)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_top_values: true,
            include_invalid_values: true,
            include_passed_constraints: true,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Only counts and failed constraints.
    pub fn minimal() -> Self {
        Self {
            include_top_values: false,
            include_invalid_values: false,
            include_passed_constraints: false,
            use_colors: false,
        }
    }

    /// Plain output suitable for CI logs.
    pub fn ci() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn with_top_values(mut self, include: bool) -> Self {
        self.include_top_values = include;
        self
    }

    pub fn with_invalid_values(mut self, include: bool) -> Self {
        self.include_invalid_values = include;
        self
    }

    pub fn with_passed_constraints(mut self, include: bool) -> Self {
        self.include_passed_constraints = include;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Turns a report into text.
pub trait ReportFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String>;
}

/// JSON output. The JSON form always carries the full report.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            report.to_json_pretty()
        } else {
            report.to_json()
        }
    }
}

/// Console summary, one block per column.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn status_line(&self, passed: bool) -> &'static str {
        match (passed, self.config.use_colors) {
            (true, true) => "✅ \x1b[32mAll constraints passed\x1b[0m",
            (true, false) => "✅ All constraints passed",
            (false, true) => "❌ \x1b[31mSome constraints failed\x1b[0m",
            (false, false) => "❌ Some constraints failed",
        }
    }

    fn write_report(&self, out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
        writeln!(out)?;
        writeln!(out, "{}", self.status_line(report.all_passed()))?;
        writeln!(out, "Analyzed {} columns", report.len())?;
        for column in report.columns() {
            self.write_column(out, column)?;
        }
        Ok(())
    }

    fn write_column(&self, out: &mut String, column: &ColumnReport) -> std::fmt::Result {
        writeln!(out)?;
        writeln!(out, "📋 Column '{}'", column.col_name)?;
        writeln!(
            out,
            "   rows: {}  nulls: {}  distinct: {}",
            column.total_count, column.null_count, column.unique_count
        )?;

        if let Some(numeric) = &column.numeric {
            writeln!(
                out,
                "   min: {}  max: {}  mean: {}  stddev: {}",
                optional(numeric.min),
                optional(numeric.max),
                optional(numeric.mean),
                optional(numeric.stddev)
            )?;
        }

        if self.config.include_top_values && !column.topn_values.is_empty() {
            let top: Vec<String> = column
                .topn_values
                .iter()
                .map(|(value, count)| format!("{value} ({count})"))
                .collect();
            writeln!(out, "   top values: {}", top.join(", "))?;
        }

        for result in &column.constraints {
            if result.constraint_status.is_success() {
                if self.config.include_passed_constraints {
                    writeln!(out, "   ✓ {} {}", result.name, result.values)?;
                }
                continue;
            }
            writeln!(
                out,
                "   ✗ {} {}: {} invalid",
                result.name, result.values, result.invalid_count
            )?;
            if self.config.include_invalid_values {
                writeln!(out, "     e.g. {}", sample_list(result))?;
            }
        }
        Ok(())
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        let mut out = String::new();
        self.write_report(&mut out, report)
            .map_err(formatting_error)?;
        Ok(out)
    }
}

/// Markdown document with a table per column.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: usize,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Sets the heading level of the document title (1-6).
    pub fn with_heading_level(mut self, level: usize) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn write_report(&self, out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
        let title = "#".repeat(self.heading_level);
        let section = "#".repeat((self.heading_level + 1).min(6));

        writeln!(out, "{title} Data Quality Report")?;
        writeln!(out)?;
        let status = if report.all_passed() {
            "✅ passed"
        } else {
            "❌ failed"
        };
        writeln!(out, "**Status:** {status} ({} columns)", report.len())?;

        for column in report.columns() {
            writeln!(out)?;
            writeln!(out, "{section} `{}`", escape_cell(&column.col_name))?;
            writeln!(out)?;
            writeln!(out, "| Metric | Value |")?;
            writeln!(out, "|--------|-------|")?;
            writeln!(out, "| Total | {} |", column.total_count)?;
            writeln!(out, "| Nulls | {} |", column.null_count)?;
            writeln!(out, "| Distinct | {} |", column.unique_count)?;
            if let Some(numeric) = &column.numeric {
                writeln!(out, "| Min | {} |", optional(numeric.min))?;
                writeln!(out, "| Max | {} |", optional(numeric.max))?;
                writeln!(out, "| Mean | {} |", optional(numeric.mean))?;
                writeln!(out, "| Stddev | {} |", optional(numeric.stddev))?;
            }

            if self.config.include_top_values && !column.topn_values.is_empty() {
                writeln!(out)?;
                writeln!(out, "| Value | Count |")?;
                writeln!(out, "|-------|-------|")?;
                for (value, count) in column.topn_values.iter() {
                    writeln!(out, "| {} | {count} |", escape_cell(value))?;
                }
            }

            let shown: Vec<&ConstraintResult> = column
                .constraints
                .iter()
                .filter(|r| self.config.include_passed_constraints || r.constraint_status.is_failed())
                .collect();
            if shown.is_empty() {
                continue;
            }

            writeln!(out)?;
            if self.config.include_invalid_values {
                writeln!(out, "| Constraint | Values | Status | Invalid | Sample |")?;
                writeln!(out, "|------------|--------|--------|---------|--------|")?;
            } else {
                writeln!(out, "| Constraint | Values | Status | Invalid |")?;
                writeln!(out, "|------------|--------|--------|---------|")?;
            }
            for result in shown {
                let status = if result.constraint_status.is_success() {
                    "✅"
                } else {
                    "❌"
                };
                write!(
                    out,
                    "| {} | `{}` | {status} | {} |",
                    escape_cell(&result.name),
                    escape_cell(&result.values.to_string()),
                    result.invalid_count
                )?;
                if self.config.include_invalid_values {
                    write!(out, " {} |", escape_cell(&sample_list(result)))?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &AnalysisReport) -> Result<String> {
        let mut out = String::new();
        self.write_report(&mut out, report)
            .map_err(formatting_error)?;
        Ok(out)
    }
}

fn formatting_error(e: std::fmt::Error) -> QualityError {
    QualityError::Internal(format!("Failed to format report: {e}"))
}

fn optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "-".to_string(),
    }
}

fn sample_list(result: &ConstraintResult) -> String {
    result
        .invalid_values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintStatus;
    use crate::profiler::NumericSummary;
    use crate::report::TopValues;
    use serde_json::json;

    fn sample_report() -> AnalysisReport {
        AnalysisReport::new(vec![ColumnReport {
            col_name: "qty".into(),
            total_count: 2,
            null_count: 0,
            unique_count: 2,
            topn_values: TopValues::from(vec![(Value::Integer(5), 1), (Value::Integer(1), 1)]),
            numeric: Some(NumericSummary {
                min: Some(1.0),
                max: Some(5.0),
                mean: Some(3.0),
                stddev: None,
            }),
            quality_score: 0.0,
            constraints: vec![
                ConstraintResult {
                    name: "eq".into(),
                    values: json!(5),
                    extra: Default::default(),
                    constraint_status: ConstraintStatus::Failed,
                    invalid_count: 1,
                    invalid_values: vec![Value::Integer(1)],
                },
                ConstraintResult {
                    name: "gt".into(),
                    values: json!(0),
                    extra: Default::default(),
                    constraint_status: ConstraintStatus::Success,
                    invalid_count: 0,
                    invalid_values: vec![],
                },
            ],
        }])
    }

    #[test]
    fn test_json_formatter_compact() {
        let report = sample_report();
        let compact = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        assert_eq!(compact, report.to_json().unwrap());
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_human_formatter() {
        let formatter = HumanFormatter::with_config(FormatterConfig::ci());
        let output = formatter.format(&sample_report()).unwrap();
        assert!(output.contains("Some constraints failed"));
        assert!(output.contains("Column 'qty'"));
        assert!(output.contains("✗ eq 5: 1 invalid"));
        assert!(output.contains("✓ gt 0"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_minimal_config_hides_passed_constraints() {
        let formatter = HumanFormatter::with_config(FormatterConfig::minimal());
        let output = formatter.format(&sample_report()).unwrap();
        assert!(!output.contains("✓ gt"));
        assert!(!output.contains("top values"));
        assert!(!output.contains("e.g."));
    }

    #[test]
    fn test_markdown_formatter() {
        let output = MarkdownFormatter::new().format(&sample_report()).unwrap();
        assert!(output.starts_with("## Data Quality Report"));
        assert!(output.contains("### `qty`"));
        assert!(output.contains("| eq | `5` | ❌ | 1 | 1 |"));
        assert!(output.contains("| Stddev | - |"));
    }
}
