//! Quoting and validation for text that is spliced into SQL.
//!
//! Column names come from user configuration and rule values from JSON, so
//! neither is trusted. Identifiers are always double-quoted and string
//! literals single-quoted; both are length-checked first.

use regex::Regex;

use crate::error::{QualityError, Result};

/// Longest identifier accepted.
const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Longest regex pattern accepted.
const MAX_PATTERN_LENGTH: usize = 1000;

/// SQL identifier and literal escaping.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and quotes a single identifier such as a column name.
    ///
    /// The whole input becomes one identifier, so a column called `a.b` stays
    /// a single column. Embedded double quotes are doubled.
    ///
    /// # Examples
    /// ```rust
    /// use dq_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("amount").unwrap(), "\"amount\"");
    /// assert_eq!(SqlSecurity::escape_identifier("say \"hi\"").unwrap(), "\"say \"\"hi\"\"\"");
    /// assert!(SqlSecurity::escape_identifier("").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        Ok(format!("\"{}\"", identifier.replace('"', "\"\"")))
    }

    /// Quotes a possibly qualified table reference (`catalog.schema.table`).
    pub fn escape_table_reference(reference: &str) -> Result<String> {
        Self::validate_identifier(reference)?;
        let parts = reference
            .split('.')
            .map(Self::escape_identifier)
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("."))
    }

    /// Checks an identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(QualityError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(QualityError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        if identifier.contains('\0') {
            return Err(QualityError::SecurityError(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Quotes a string literal. Backslashes are not escape characters in
    /// DataFusion literals and pass through unchanged.
    pub fn escape_string_literal(value: &str) -> Result<String> {
        if value.contains('\0') {
            return Err(QualityError::SecurityError(
                "String literal cannot contain null bytes".to_string(),
            ));
        }
        Ok(format!("'{}'", value.replace('\'', "''")))
    }

    /// Validates a regex pattern, returning the compiled expression.
    ///
    /// The pattern must compile with the `regex` crate, which is also the
    /// engine DataFusion uses, so a pattern accepted here behaves the same on
    /// both backends.
    pub fn validate_regex_pattern(pattern: &str) -> Result<Regex> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(QualityError::SecurityError(format!(
                "Regex pattern too long (max {MAX_PATTERN_LENGTH} characters)"
            )));
        }

        if pattern.contains('\0') {
            return Err(QualityError::SecurityError(
                "Regex pattern cannot contain null bytes".to_string(),
            ));
        }

        Regex::new(pattern)
            .map_err(|e| QualityError::SecurityError(format!("Invalid regex pattern: {e}")))
    }
}
