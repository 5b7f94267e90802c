//! Analysis configuration: per-column rule sets and analyzer settings.
//!
//! Column configuration is plain JSON:
//!
//! ```json
//! [
//!   {
//!     "name": "amount",
//!     "datatype": "number",
//!     "constraints": [
//!       { "name": "gt_eq", "values": 0 },
//!       { "name": "between", "values": [0, 10000] }
//!     ]
//!   }
//! ]
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, Result};
use crate::logging::LogConfig;

/// Number of invalid values sampled per constraint.
pub const DEFAULT_SAMPLE_LIMIT: usize = 10;

/// Number of most frequent values reported per column.
pub const DEFAULT_TOP_N: usize = 10;

/// Declared datatype of a column.
///
/// Any string deserializes; names other than `string`, `number` and `integer`
/// are kept as [`Datatype::Unsupported`] and rejected when the column is
/// analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Datatype {
    String,
    Number,
    Integer,
    Unsupported(String),
}

impl Datatype {
    /// The rule family that applies to this datatype.
    pub fn family(&self) -> Option<RuleFamily> {
        match self {
            Datatype::String => Some(RuleFamily::String),
            Datatype::Number | Datatype::Integer => Some(RuleFamily::Numeric),
            Datatype::Unsupported(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Datatype::String => "string",
            Datatype::Number => "number",
            Datatype::Integer => "integer",
            Datatype::Unsupported(name) => name,
        }
    }
}

impl From<String> for Datatype {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => Datatype::String,
            "number" => Datatype::Number,
            "integer" => Datatype::Integer,
            _ => Datatype::Unsupported(value),
        }
    }
}

impl From<&str> for Datatype {
    fn from(value: &str) -> Self {
        Datatype::from(value.to_string())
    }
}

impl From<Datatype> for String {
    fn from(value: Datatype) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule vocabulary a column uses, selected by its datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    Numeric,
    String,
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFamily::Numeric => f.write_str("numeric"),
            RuleFamily::String => f.write_str("string"),
        }
    }
}

/// One declared rule: a rule name plus its parameters.
///
/// `values` is a scalar or an array depending on the rule; it is checked when
/// the rule runs. Extra keys are kept and echoed into the rule's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default)]
    pub values: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>, values: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            values: values.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Configuration of one column: its name, expected datatype and rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub datatype: Datatype,
    #[serde(default)]
    pub constraints: Vec<RuleSpec>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, datatype: impl Into<Datatype>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            constraints: Vec::new(),
        }
    }

    /// Appends a rule.
    pub fn rule(mut self, name: impl Into<String>, values: impl Into<serde_json::Value>) -> Self {
        self.constraints.push(RuleSpec::new(name, values));
        self
    }

    /// Parses an ordered list of column configurations from JSON text.
    pub fn list_from_json_str(json: &str) -> Result<Vec<ColumnConfig>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads an ordered list of column configurations from a JSON file.
    pub fn list_from_path(path: impl AsRef<Path>) -> Result<Vec<ColumnConfig>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading column configuration {}", path.display()))?;
        Self::list_from_json_str(&text)
            .with_context(|| format!("Parsing column configuration {}", path.display()))
    }
}

/// Settings for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Logging behaviour for the run
    pub log: LogConfig,
    /// Maximum number of invalid values sampled per constraint
    pub sample_limit: usize,
    /// Number of most frequent values reported per column
    pub top_n: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Sets the per-constraint sample size. Clamped to at least one.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit.max(1);
        self
    }

    /// Sets the size of the frequency table. Clamped to at least one.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }
}
