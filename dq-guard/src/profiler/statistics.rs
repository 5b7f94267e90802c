//! Descriptive statistics shared by both column profilers.

use serde::Serialize;
use tracing::instrument;

use crate::config::RuleFamily;
use crate::error::Result;
use crate::predicate::Predicate;
use crate::report::TopValues;
use crate::sources::{Aggregate, TabularSource};
use crate::value::Value;

/// Streaming mean and variance (Welford's algorithm).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMoments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (n - 1 denominator).
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    pub fn sample_stddev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}

impl FromIterator<f64> for RunningMoments {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut moments = Self::default();
        for value in iter {
            moments.push(value);
        }
        moments
    }
}

/// Min, max, mean and sample standard deviation of a numeric column.
///
/// Each field is `None` when it is undefined for the column (no usable
/// values, or fewer than two for the standard deviation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NumericSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl NumericSummary {
    #[instrument(skip(source, column))]
    pub async fn compute<S: TabularSource>(source: &S, column: &S::Column) -> Result<Self> {
        Ok(Self {
            min: source.aggregate(column, Aggregate::Min).await?,
            max: source.aggregate(column, Aggregate::Max).await?,
            mean: source.aggregate(column, Aggregate::Mean).await?,
            stddev: source.aggregate(column, Aggregate::StdDev).await?,
        })
    }
}

/// Counts and frequencies every column report carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub total_count: u64,
    pub null_count: u64,
    pub unique_count: u64,
    pub topn_values: TopValues,
}

impl ColumnStatistics {
    /// Computes the statistics of an already cast column.
    #[instrument(skip(source, column))]
    pub async fn compute<S: TabularSource>(
        source: &S,
        column: &S::Column,
        family: RuleFamily,
        top_n: usize,
    ) -> Result<Self> {
        let total_count = source.count(column).await?;

        let null_like = source.filter(column, &null_like_predicate(family)).await?;
        let null_count = source.count(&null_like).await?;

        let unique_count = source.distinct_count(column).await?;

        let rankable = source.filter(column, &top_n_predicate(family)).await?;
        let topn_values = TopValues::from(source.group_count_top(&rankable, top_n).await?);

        Ok(Self {
            total_count,
            null_count,
            unique_count,
            topn_values,
        })
    }
}

/// Cells counted as missing.
///
/// String columns also count the markers `"None"` and `"NULL"` anywhere in
/// the text, so `"NULL_ISLAND"` is counted too.
pub fn null_like_predicate(family: RuleFamily) -> Predicate {
    match family {
        RuleFamily::String => Predicate::any_of([
            Predicate::IsNull,
            Predicate::IsEmpty,
            Predicate::IsNaN,
            Predicate::Contains("None".to_string()),
            Predicate::Contains("NULL".to_string()),
        ]),
        RuleFamily::Numeric => Predicate::any_of([Predicate::IsNull, Predicate::IsNaN]),
    }
}

/// Cells eligible for the top-N frequency table.
pub fn top_n_predicate(family: RuleFamily) -> Predicate {
    match family {
        RuleFamily::String => Predicate::any_of([
            Predicate::IsNull,
            Predicate::IsEmpty,
            Predicate::Eq(Value::from("null")),
        ])
        .not(),
        RuleFamily::Numeric => Predicate::IsNull.not(),
    }
}
