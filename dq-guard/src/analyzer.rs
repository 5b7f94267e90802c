//! Top-level entry point: runs every configured column and collects the
//! report.

use tracing::{info, instrument};

use crate::config::{AnalyzerConfig, ColumnConfig};
use crate::error::Result;
use crate::log_data_op;
use crate::profiler::ColumnProfiler;
use crate::report::AnalysisReport;
use crate::sources::TabularSource;

/// Analyzes a table against a list of column configurations.
///
/// Columns are processed one after another in configuration order. The first
/// error aborts the run and no partial report is returned.
///
/// # Examples
///
/// ```rust
/// use dq_guard::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let table = MemoryTable::new().with_column("code", vec!["abc", "xyz"]);
/// let columns = vec![ColumnConfig::new("code", "string").rule("starts_with", "a")];
///
/// let report = Analyzer::new().analyze(&table, &columns).await?;
/// let code = &report.columns()[0];
/// assert_eq!(code.constraints[0].invalid_count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs the analysis and returns one report entry per configured column.
    #[instrument(skip(self, source, columns), fields(source = %source.description(), columns = columns.len()))]
    pub async fn analyze<S: TabularSource>(
        &self,
        source: &S,
        columns: &[ColumnConfig],
    ) -> Result<AnalysisReport> {
        let mut reports = Vec::with_capacity(columns.len());

        for column_config in columns {
            log_data_op!(
                self.config.log,
                column = %column_config.name,
                datatype = %column_config.datatype,
                "Selecting column"
            );
            let column = source.select_column(&column_config.name).await?;

            let mut profiler = ColumnProfiler::for_datatype(
                source,
                column,
                &column_config.name,
                &column_config.datatype,
                &self.config,
            )?;
            profiler.add_rules(&column_config.constraints)?;
            reports.push(profiler.run().await?);
        }

        let report = AnalysisReport::new(reports);
        info!(
            columns = report.len(),
            all_passed = report.all_passed(),
            "Analysis complete"
        );
        Ok(report)
    }

    /// Runs the analysis and serializes the report as a JSON array.
    pub async fn analyze_to_json<S: TabularSource>(
        &self,
        source: &S,
        columns: &[ColumnConfig],
    ) -> Result<String> {
        self.analyze(source, columns).await?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QualityError;
    use crate::sources::MemoryTable;
    use crate::test_fixtures::create_mixed_table;

    #[tokio::test]
    async fn test_reports_follow_configuration_order() {
        let table = create_mixed_table();
        let columns = vec![
            ColumnConfig::new("amount", "number"),
            ColumnConfig::new("city", "string"),
            ColumnConfig::new("id", "integer"),
        ];
        let report = Analyzer::new().analyze(&table, &columns).await.unwrap();
        let names: Vec<&str> = report
            .columns()
            .iter()
            .map(|column| column.col_name.as_str())
            .collect();
        assert_eq!(names, vec!["amount", "city", "id"]);
        assert!(report.columns()[1].numeric.is_none());
        assert!(report.columns()[2].numeric.is_some());
    }

    #[tokio::test]
    async fn test_missing_column_aborts() {
        let table = create_mixed_table();
        let columns = vec![
            ColumnConfig::new("city", "string"),
            ColumnConfig::new("ghost", "string"),
        ];
        let err = Analyzer::new().analyze(&table, &columns).await.unwrap_err();
        assert!(matches!(err, QualityError::ColumnNotFound { ref column } if column == "ghost"));
    }

    #[tokio::test]
    async fn test_unsupported_datatype() {
        let table = MemoryTable::new().with_column("when", vec!["2024-01-01"]);
        let columns = vec![ColumnConfig::new("when", "date")];
        let err = Analyzer::new().analyze(&table, &columns).await.unwrap_err();
        assert!(
            matches!(err, QualityError::UnsupportedDatatype { ref datatype } if datatype == "date")
        );
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let table = create_mixed_table();
        let json = Analyzer::new().analyze_to_json(&table, &[]).await.unwrap();
        assert_eq!(json, "[]");
    }
}
