//! Logging controls for analysis runs.
//!
//! dq-guard only emits `tracing` events. How much a run reports is decided by
//! the [`LogConfig`] carried in
//! [`AnalyzerConfig`](crate::config::AnalyzerConfig); nothing is printed
//! unless the caller installs a subscriber, for example with
//! [`setup::init_logging`].
//!
//! | Event | Level | Gate |
//! |-------|-------|------|
//! | column selected / cast | info | [`LogConfig::column_progress`] |
//! | rule outcome with sample | debug | [`LogConfig::rule_details`] |
//! | column / run summary | info | always |

use crate::value::Value;

/// Per-run logging switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log every rule's outcome together with its invalid-value sample
    pub rule_details: bool,
    /// Log column selection and casting
    pub column_progress: bool,
    /// Longest rendering of a sample written into a single event
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            rule_details: false,
            column_progress: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Everything on, with long samples.
    pub fn verbose() -> Self {
        Self {
            rule_details: true,
            column_progress: true,
            max_field_length: 1024,
        }
    }

    /// Only the per-column and per-run summaries.
    pub fn quiet() -> Self {
        Self {
            rule_details: false,
            column_progress: false,
            max_field_length: 128,
        }
    }

    /// Renders an invalid-value sample for a log field, cut at
    /// `max_field_length`.
    pub fn render_sample(&self, values: &[Value]) -> String {
        let rendered = values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        truncate_field(&format!("[{rendered}]"), self.max_field_length)
    }
}

/// Emits a debug event for a rule outcome when `rule_details` is set.
#[macro_export]
macro_rules! log_constraint {
    ($config:expr, $($arg:tt)*) => {
        if $config.rule_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Emits an info event for column progress when `column_progress` is set.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.column_progress {
            tracing::info!($($arg)*);
        }
    };
}

/// Cuts `value` to at most `max_length` bytes on a character boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Opt-in subscriber installation.
pub mod setup {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    const DEFAULT_FILTER: &str = "warn,dq_guard=info";

    /// How [`init_logging`] builds the global subscriber.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LoggingConfig {
        /// `EnvFilter` directives, used when `RUST_LOG` is unset
        pub filter: String,
        /// One JSON object per event instead of human-readable lines
        pub json: bool,
        /// Emit an event when an instrumented span closes, with its timing
        pub span_timings: bool,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                filter: DEFAULT_FILTER.to_string(),
                json: false,
                span_timings: false,
            }
        }
    }

    impl LoggingConfig {
        /// JSON lines at the default filter, for log collectors.
        pub fn json() -> Self {
            Self {
                json: true,
                ..Self::default()
            }
        }

        /// Library debug output with span timings.
        pub fn debug() -> Self {
            Self {
                filter: "info,dq_guard=debug".to_string(),
                json: false,
                span_timings: true,
            }
        }

        pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
            self.filter = filter.into();
            self
        }

        pub fn with_json(mut self, enabled: bool) -> Self {
            self.json = enabled;
            self
        }

        pub fn with_span_timings(mut self, enabled: bool) -> Self {
            self.span_timings = enabled;
            self
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over [`LoggingConfig::filter`]. Fails if a
    /// global subscriber is already set.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dq_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::json()).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        let env_filter =
            EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

        let span_events = if config.span_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let fmt_layer = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(span_events)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_span_events(span_events)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = LogConfig::default();
        assert!(!default.rule_details);
        assert!(default.column_progress);

        assert!(LogConfig::verbose().rule_details);

        let quiet = LogConfig::quiet();
        assert!(!quiet.column_progress);
        assert_eq!(quiet.max_field_length, 128);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text", 10),
            "this is a ...(truncated)"
        );
        assert_eq!(truncate_field("ééé", 3), "é...(truncated)");
    }

    #[test]
    fn test_render_sample() {
        let config = LogConfig::default();
        let sample = vec![Value::Integer(9), Value::from("x"), Value::Null];
        assert_eq!(config.render_sample(&sample), "[9, x, null]");

        let short = LogConfig {
            max_field_length: 4,
            ..LogConfig::default()
        };
        assert_eq!(short.render_sample(&sample), "[9, ...(truncated)");
    }

    #[test]
    fn test_subscriber_presets() {
        let config = setup::LoggingConfig::default();
        assert_eq!(config.filter, "warn,dq_guard=info");
        assert!(!config.json);

        assert!(setup::LoggingConfig::json().json);
        assert!(setup::LoggingConfig::debug().span_timings);

        let custom = setup::LoggingConfig::default().with_filter("dq_guard=trace");
        assert_eq!(custom.filter, "dq_guard=trace");
    }
}
