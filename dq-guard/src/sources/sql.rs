//! DataFusion backend: every column operation becomes one SQL query.

use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::execution::session_state::SessionStateBuilder;
use datafusion::prelude::{SessionConfig, SessionContext};
use tracing::{debug, instrument};

use super::{Aggregate, TabularSource};
use crate::config::Datatype;
use crate::error::{QualityError, Result};
use crate::predicate::Predicate;
use crate::security::SqlSecurity;
use crate::value::Value;

/// A table registered in a DataFusion [`SessionContext`].
///
/// The context is cloned on construction; registering more tables on the
/// caller's copy afterwards is visible here since both share one session
/// state.
#[derive(Clone)]
pub struct DataFusionSource {
    ctx: SessionContext,
    table_name: String,
    table_sql: String,
}

impl std::fmt::Debug for DataFusionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionSource")
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

/// Broad physical type of a column expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprKind {
    Text,
    Float,
    Integer,
    Other,
}

impl ExprKind {
    fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ExprKind::Text,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => ExprKind::Float,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ExprKind::Integer,
            _ => ExprKind::Other,
        }
    }
}

/// Handle to a column of a [`DataFusionSource`]: a SQL expression plus the
/// filters narrowing it.
#[derive(Debug, Clone)]
pub struct SqlColumn {
    name: String,
    expr: String,
    kind: ExprKind,
    filters: Vec<String>,
}

impl SqlColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The SQL expression selecting the column's values.
    pub fn expression(&self) -> &str {
        &self.expr
    }
}

impl DataFusionSource {
    /// Wraps the table `table_name` of `ctx`.
    pub fn new(ctx: SessionContext, table_name: impl Into<String>) -> Result<Self> {
        let table_name = table_name.into();
        let table_sql = SqlSecurity::escape_table_reference(&table_name)?;
        Ok(Self {
            ctx,
            table_name,
            table_sql,
        })
    }

    /// Registers `batch` as `table_name` in a fresh single-partition session.
    pub fn from_record_batch(table_name: impl Into<String>, batch: RecordBatch) -> Result<Self> {
        let table_name = table_name.into();
        let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
        ctx.register_batch(&table_name, batch)?;
        Self::new(ctx, table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    fn where_clause(column: &SqlColumn, extra: Option<&str>) -> String {
        let conditions: Vec<&str> = column
            .filters
            .iter()
            .map(String::as_str)
            .chain(extra)
            .collect();
        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        debug!(sql = sql, "Executing query");
        Ok(self.ctx.sql(sql).await?.collect().await?)
    }

    /// A view of the same catalog that scans with one partition, so rows come
    /// back in the provider's scan order.
    fn single_partition_context(&self) -> SessionContext {
        let state = self.ctx.state();
        let config = state.config().clone().with_target_partitions(1);
        let state = SessionStateBuilder::new_from_existing(state)
            .with_config(config)
            .build();
        SessionContext::new_with_state(state)
    }

    /// Reads the single cell of a one-row aggregate query.
    async fn query_scalar(&self, sql: &str) -> Result<Value> {
        let batches = self.query(sql).await?;
        match batches.iter().find(|batch| batch.num_rows() > 0) {
            Some(batch) => Value::from_arrow(batch.column(0).as_ref(), 0),
            None => Ok(Value::Null),
        }
    }

    async fn query_count(&self, sql: &str) -> Result<u64> {
        match self.query_scalar(sql).await? {
            Value::Integer(count) => Ok(count.max(0) as u64),
            Value::Null => Ok(0),
            other => Err(QualityError::Internal(format!(
                "Expected an integer count, got {other}"
            ))),
        }
    }

    /// Renders `predicate` as a boolean SQL expression over `column`.
    fn predicate_sql(column: &SqlColumn, predicate: &Predicate) -> Result<String> {
        let expr = column.expr.as_str();
        let text_expr = || match column.kind {
            ExprKind::Text => expr.to_string(),
            _ => format!("CAST({expr} AS VARCHAR)"),
        };
        let compare = |op: &str, value: &Value| -> Result<String> {
            Ok(format!("{expr} {op} {}", literal(value)?))
        };

        let sql = match predicate {
            Predicate::Eq(v) => compare("=", v)?,
            Predicate::NotEq(v) => compare("<>", v)?,
            Predicate::Lt(v) => compare("<", v)?,
            Predicate::Gt(v) => compare(">", v)?,
            Predicate::LtEq(v) => compare("<=", v)?,
            Predicate::GtEq(v) => compare(">=", v)?,
            Predicate::Between(low, high) => {
                format!("{expr} BETWEEN {} AND {}", literal(low)?, literal(high)?)
            }
            Predicate::NotBetween(low, high) => {
                format!("{expr} NOT BETWEEN {} AND {}", literal(low)?, literal(high)?)
            }
            Predicate::In(values) if values.is_empty() => {
                format!("CASE WHEN {expr} IS NULL THEN NULL ELSE FALSE END")
            }
            Predicate::NotIn(values) if values.is_empty() => {
                format!("CASE WHEN {expr} IS NULL THEN NULL ELSE TRUE END")
            }
            Predicate::In(values) => format!("{expr} IN ({})", literal_list(values)?),
            Predicate::NotIn(values) => format!("{expr} NOT IN ({})", literal_list(values)?),
            Predicate::Contains(s) => format!("strpos({}, {}) > 0", text_expr(), quote(s)?),
            Predicate::NotContains(s) => format!("strpos({}, {}) = 0", text_expr(), quote(s)?),
            Predicate::StartsWith(s) => format!("starts_with({}, {})", text_expr(), quote(s)?),
            Predicate::NotStartsWith(s) => {
                format!("NOT starts_with({}, {})", text_expr(), quote(s)?)
            }
            Predicate::EndsWith(s) => format!("ends_with({}, {})", text_expr(), quote(s)?),
            Predicate::NotEndsWith(s) => format!("NOT ends_with({}, {})", text_expr(), quote(s)?),
            Predicate::Regex(pattern) => {
                SqlSecurity::validate_regex_pattern(pattern)?;
                format!("{} ~ {}", text_expr(), quote(pattern)?)
            }
            Predicate::NotRegex(pattern) => {
                SqlSecurity::validate_regex_pattern(pattern)?;
                format!("{} !~ {}", text_expr(), quote(pattern)?)
            }
            Predicate::IsNull => format!("{expr} IS NULL"),
            Predicate::IsEmpty => match column.kind {
                ExprKind::Text => format!("{expr} = ''"),
                _ => format!("CASE WHEN {expr} IS NULL THEN NULL ELSE FALSE END"),
            },
            Predicate::IsNaN => match column.kind {
                ExprKind::Float => format!("isnan({expr})"),
                ExprKind::Text => format!("lower({expr}) = 'nan'"),
                _ => format!("CASE WHEN {expr} IS NULL THEN NULL ELSE FALSE END"),
            },
            Predicate::Not(inner) => format!("NOT {}", Self::predicate_sql(column, inner)?),
            Predicate::And(parts) => Self::join_predicates(column, parts, "AND", "TRUE")?,
            Predicate::Or(parts) => Self::join_predicates(column, parts, "OR", "FALSE")?,
        };
        Ok(format!("({sql})"))
    }

    fn join_predicates(
        column: &SqlColumn,
        parts: &[Predicate],
        operator: &str,
        empty: &str,
    ) -> Result<String> {
        if parts.is_empty() {
            return Ok(empty.to_string());
        }
        let rendered = parts
            .iter()
            .map(|part| Self::predicate_sql(column, part))
            .collect::<Result<Vec<_>>>()?;
        Ok(rendered.join(&format!(" {operator} ")))
    }
}

fn quote(text: &str) -> Result<String> {
    SqlSecurity::escape_string_literal(text)
}

fn literal_list(values: &[Value]) -> Result<String> {
    Ok(values
        .iter()
        .map(literal)
        .collect::<Result<Vec<_>>>()?
        .join(", "))
}

/// Renders a value as a SQL literal.
fn literal(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) if n.is_nan() => "CAST('NaN' AS DOUBLE)".to_string(),
        Value::Number(n) if n.is_infinite() => {
            let sign = if *n > 0.0 { "" } else { "-" };
            format!("CAST('{sign}inf' AS DOUBLE)")
        }
        Value::Number(n) => format!("CAST({n:?} AS DOUBLE)"),
        Value::Text(s) => SqlSecurity::escape_string_literal(s)?,
    })
}

#[async_trait]
impl TabularSource for DataFusionSource {
    type Column = SqlColumn;

    fn description(&self) -> String {
        format!("DataFusion table '{}'", self.table_name)
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn select_column(&self, name: &str) -> Result<SqlColumn> {
        let provider = self.ctx.table_provider(self.table_name.as_str()).await?;
        let schema = provider.schema();
        let field = schema
            .field_with_name(name)
            .map_err(|_| QualityError::column_not_found(name))?;

        Ok(SqlColumn {
            name: name.to_string(),
            expr: SqlSecurity::escape_identifier(name)?,
            kind: ExprKind::of(field.data_type()),
            filters: Vec::new(),
        })
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn cast(&self, column: &SqlColumn, datatype: &Datatype) -> Result<SqlColumn> {
        let expr = column.expr.as_str();
        let (expr, kind) = match (datatype, column.kind) {
            (Datatype::String, ExprKind::Text) => (expr.to_string(), ExprKind::Text),
            (Datatype::String, _) => (format!("TRY_CAST({expr} AS VARCHAR)"), ExprKind::Text),
            (Datatype::Number, ExprKind::Float) => (expr.to_string(), ExprKind::Float),
            (Datatype::Number, ExprKind::Text) => {
                (format!("TRY_CAST(trim({expr}) AS DOUBLE)"), ExprKind::Float)
            }
            (Datatype::Number, _) => (format!("TRY_CAST({expr} AS DOUBLE)"), ExprKind::Float),
            (Datatype::Integer, ExprKind::Text) => {
                (format!("TRY_CAST(trim({expr}) AS BIGINT)"), ExprKind::Integer)
            }
            (Datatype::Integer, _) => (format!("TRY_CAST({expr} AS BIGINT)"), ExprKind::Integer),
            (Datatype::Unsupported(name), _) => {
                return Err(QualityError::UnsupportedDatatype {
                    datatype: name.clone(),
                })
            }
        };

        Ok(SqlColumn {
            name: column.name.clone(),
            expr,
            kind,
            filters: column.filters.clone(),
        })
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn count(&self, column: &SqlColumn) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) AS row_count FROM {}{}",
            self.table_sql,
            Self::where_clause(column, None)
        );
        self.query_count(&sql).await
    }

    #[instrument(skip(self, column, predicate), fields(column = %column.name, predicate = predicate.label()))]
    async fn filter(&self, column: &SqlColumn, predicate: &Predicate) -> Result<SqlColumn> {
        let condition = Self::predicate_sql(column, predicate)?;
        let mut filtered = column.clone();
        filtered.filters.push(condition);
        Ok(filtered)
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn distinct_count(&self, column: &SqlColumn) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {}) AS distinct_count FROM {}{}",
            column.expr,
            self.table_sql,
            Self::where_clause(column, None)
        );
        self.query_count(&sql).await
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn group_count_top(&self, column: &SqlColumn, n: usize) -> Result<Vec<(Value, u64)>> {
        let not_null = format!("{} IS NOT NULL", column.expr);
        let sql = format!(
            "SELECT {expr} AS group_value, COUNT(*) AS value_count FROM {table}{filter} \
             GROUP BY {expr} ORDER BY value_count DESC, group_value ASC LIMIT {n}",
            expr = column.expr,
            table = self.table_sql,
            filter = Self::where_clause(column, Some(&not_null)),
        );

        let mut counts = Vec::new();
        for batch in self.query(&sql).await? {
            for row in 0..batch.num_rows() {
                let value = Value::from_arrow(batch.column(0).as_ref(), row)?;
                let count = match Value::from_arrow(batch.column(1).as_ref(), row)? {
                    Value::Integer(count) => count.max(0) as u64,
                    other => {
                        return Err(QualityError::Internal(format!(
                            "Expected an integer group count, got {other}"
                        )))
                    }
                };
                counts.push((value, count));
            }
        }
        Ok(counts)
    }

    #[instrument(skip(self, column), fields(column = %column.name, aggregate = aggregate.name()))]
    async fn aggregate(&self, column: &SqlColumn, aggregate: Aggregate) -> Result<Option<f64>> {
        let function = match aggregate {
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Mean => "AVG",
            Aggregate::StdDev => "STDDEV",
        };
        let numeric = format!("TRY_CAST({} AS DOUBLE)", column.expr);
        let usable = format!("{numeric} IS NOT NULL AND NOT isnan({numeric})");
        let sql = format!(
            "SELECT {function}({numeric}) AS {} FROM {}{}",
            aggregate.name(),
            self.table_sql,
            Self::where_clause(column, Some(&usable))
        );

        Ok(self.query_scalar(&sql).await?.as_f64())
    }

    #[instrument(skip(self, column), fields(column = %column.name))]
    async fn sample(&self, column: &SqlColumn, n: usize) -> Result<Vec<Value>> {
        let sql = format!(
            "SELECT {} AS sample_value FROM {}{} LIMIT {n}",
            column.expr,
            self.table_sql,
            Self::where_clause(column, None)
        );

        debug!(sql = %sql, "Executing sample query");
        let batches = self
            .single_partition_context()
            .sql(&sql)
            .await?
            .collect()
            .await?;

        let mut values = Vec::with_capacity(n);
        for batch in batches {
            for row in 0..batch.num_rows() {
                values.push(Value::from_arrow(batch.column(0).as_ref(), row)?);
            }
        }
        values.truncate(n);
        Ok(values)
    }
}
