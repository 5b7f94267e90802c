//! Error types for the dq-guard quality analysis library.
//!
//! All errors are represented by the [`QualityError`] enum. Configuration
//! problems (unknown columns, datatypes or rules, duplicate or malformed rules)
//! each have a dedicated variant. Backend failures from DataFusion or Arrow are
//! carried through transparently so callers see the original error.

use thiserror::Error;

/// The main error type for the dq-guard library.
#[derive(Error, Debug)]
pub enum QualityError {
    /// The configuration references a column that the table does not have.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// The declared datatype is not one of `string`, `number` or `integer`.
    #[error("Unsupported datatype '{datatype}': expected one of string, number, integer")]
    UnsupportedDatatype { datatype: String },

    /// The rule name is not implemented for the column's family.
    #[error("Unsupported rule '{rule}' for {family} columns")]
    UnsupportedRule { rule: String, family: String },

    /// The same rule name was declared twice for one column.
    #[error("A '{rule}' constraint for the column '{column}' already exists")]
    DuplicateConstraint { rule: String, column: String },

    /// The rule's `values` do not have the shape the rule expects.
    #[error("Malformed values for '{rule}' on column '{column}': {message}")]
    MalformedConstraintValues {
        rule: String,
        column: String,
        message: String,
    },

    /// Error from DataFusion operations.
    #[error(transparent)]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error related to configuration loading.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Security-related error, e.g. an identifier that cannot be quoted safely.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, QualityError>`.
pub type Result<T> = std::result::Result<T, QualityError>;

impl QualityError {
    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an unsupported-rule error.
    pub fn unsupported_rule(rule: impl Into<String>, family: impl ToString) -> Self {
        Self::UnsupportedRule {
            rule: rule.into(),
            family: family.to_string(),
        }
    }

    /// Creates a duplicate-constraint error.
    pub fn duplicate_constraint(rule: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DuplicateConstraint {
            rule: rule.into(),
            column: column.into(),
        }
    }

    /// Creates a malformed-values error.
    pub fn malformed_values(
        rule: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedConstraintValues {
            rule: rule.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns true when the error comes from the analysis configuration rather
    /// than from the backend. Configuration errors are never transient.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound { .. }
                | Self::UnsupportedDatatype { .. }
                | Self::UnsupportedRule { .. }
                | Self::DuplicateConstraint { .. }
                | Self::MalformedConstraintValues { .. }
                | Self::Configuration(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<QualityError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            QualityError::Configuration(inner) => {
                QualityError::Configuration(format!("{}: {inner}", f()))
            }
            other => QualityError::Configuration(format!("{}: {other}", f())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found() {
        let err = QualityError::column_not_found("ghost");
        assert_eq!(err.to_string(), "Column 'ghost' not found in dataset");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_duplicate_constraint_message() {
        let err = QualityError::duplicate_constraint("eq", "amount");
        assert_eq!(
            err.to_string(),
            "A 'eq' constraint for the column 'amount' already exists"
        );
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let inner = datafusion::error::DataFusionError::Plan("table 'x' not found".to_string());
        let expected = inner.to_string();
        let err: QualityError = inner.into();
        assert_eq!(err.to_string(), expected);
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_error_context() {
        fn failing_read() -> std::result::Result<(), std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }

        let err = failing_read().context("Reading rules.json").unwrap_err();
        assert!(matches!(err, QualityError::Configuration(_)));
        assert!(err.to_string().contains("Reading rules.json"));
    }
}
