//! Per-column profiling: statistics plus constraint checks.
//!
//! A [`ColumnProfiler`] comes in two variants. The string variant treats the
//! column as text and uses the string rule family; the number variant casts
//! to a numeric type, uses the numeric rule family and adds a
//! [`NumericSummary`] to the report.

use tracing::{info, instrument};

use crate::config::{AnalyzerConfig, Datatype, RuleFamily, RuleSpec};
use crate::constraints::Constraint;
use crate::error::{QualityError, Result};
use crate::report::ColumnReport;
use crate::sources::TabularSource;
use crate::{log_constraint, log_data_op};

pub mod statistics;

pub use statistics::{ColumnStatistics, NumericSummary, RunningMoments};

/// Profiles one column of a source.
///
/// Constraints are registered first and the data is only touched by
/// [`ColumnProfiler::run`], so an invalid rule set fails without scanning the
/// table.
#[derive(Debug)]
pub struct ColumnProfiler<'a, S: TabularSource> {
    source: &'a S,
    column: S::Column,
    column_name: String,
    datatype: Datatype,
    family: RuleFamily,
    constraints: Vec<Constraint>,
    config: &'a AnalyzerConfig,
}

impl<'a, S: TabularSource> ColumnProfiler<'a, S> {
    /// Creates the string variant.
    pub fn string(
        source: &'a S,
        column: S::Column,
        column_name: impl Into<String>,
        config: &'a AnalyzerConfig,
    ) -> Self {
        Self {
            source,
            column,
            column_name: column_name.into(),
            datatype: Datatype::String,
            family: RuleFamily::String,
            constraints: Vec::new(),
            config,
        }
    }

    /// Creates the number variant for `number` or `integer` columns.
    pub fn number(
        source: &'a S,
        column: S::Column,
        column_name: impl Into<String>,
        datatype: Datatype,
        config: &'a AnalyzerConfig,
    ) -> Result<Self> {
        if datatype.family() != Some(RuleFamily::Numeric) {
            return Err(QualityError::UnsupportedDatatype {
                datatype: datatype.to_string(),
            });
        }
        Ok(Self {
            source,
            column,
            column_name: column_name.into(),
            datatype,
            family: RuleFamily::Numeric,
            constraints: Vec::new(),
            config,
        })
    }

    /// Creates the variant matching `datatype`.
    pub fn for_datatype(
        source: &'a S,
        column: S::Column,
        column_name: impl Into<String>,
        datatype: &Datatype,
        config: &'a AnalyzerConfig,
    ) -> Result<Self> {
        match datatype.family() {
            Some(RuleFamily::String) => Ok(Self::string(source, column, column_name, config)),
            Some(RuleFamily::Numeric) => {
                Self::number(source, column, column_name, datatype.clone(), config)
            }
            None => Err(QualityError::UnsupportedDatatype {
                datatype: datatype.to_string(),
            }),
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn family(&self) -> RuleFamily {
        self.family
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Registers a constraint. A second constraint with the same rule name on
    /// this column fails with `DuplicateConstraint`.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<()> {
        if self
            .constraints
            .iter()
            .any(|existing| existing.name() == constraint.name())
        {
            return Err(QualityError::duplicate_constraint(
                constraint.name(),
                &self.column_name,
            ));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Resolves and registers each rule, in order.
    pub fn add_rules(&mut self, rules: &[RuleSpec]) -> Result<()> {
        for spec in rules {
            let constraint = Constraint::new(spec, &self.column_name, self.family)?
                .with_sample_limit(self.config.sample_limit);
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Casts the column, computes its statistics, runs every constraint in
    /// registration order and assembles the report.
    #[instrument(skip(self), fields(column = %self.column_name, datatype = %self.datatype))]
    pub async fn run(self) -> Result<ColumnReport> {
        let start_time = std::time::Instant::now();
        let log = &self.config.log;

        log_data_op!(
            log,
            column = %self.column_name,
            datatype = %self.datatype,
            "Casting column"
        );
        let column = self.source.cast(&self.column, &self.datatype).await?;

        let stats =
            ColumnStatistics::compute(self.source, &column, self.family, self.config.top_n)
                .await?;
        let numeric = match self.family {
            RuleFamily::Numeric => Some(NumericSummary::compute(self.source, &column).await?),
            RuleFamily::String => None,
        };

        let mut results = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let result = constraint.execute(self.source, &column).await?;
            log_constraint!(
                log,
                column = %self.column_name,
                rule = constraint.name(),
                invalid_count = result.invalid_count,
                status = ?result.constraint_status,
                sample = %log.render_sample(&result.invalid_values),
                "Constraint checked"
            );
            results.push(result);
        }

        let failed = results
            .iter()
            .filter(|result| result.constraint_status.is_failed())
            .count();
        info!(
            column = %self.column_name,
            total_count = stats.total_count,
            null_count = stats.null_count,
            constraints = results.len(),
            failed,
            time_ms = start_time.elapsed().as_millis() as u64,
            "Completed column profiling"
        );

        Ok(ColumnReport {
            col_name: self.column_name,
            total_count: stats.total_count,
            null_count: stats.null_count,
            unique_count: stats.unique_count,
            topn_values: stats.topn_values,
            numeric,
            quality_score: 0.0,
            constraints: results,
        })
    }
}
