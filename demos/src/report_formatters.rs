//! Example demonstrating the report formatters.
//!
//! This example shows how to render one analysis report as:
//! - compact and pretty JSON for programmatic consumption
//! - a console summary
//! - a Markdown document
//!
//! Run with:
//! ```bash
//! cargo run --example report_formatters
//! ```

use std::error::Error;

use dq_guard::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
use dq_guard::prelude::*;
use serde_json::json;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    let table = MemoryTable::new()
        .with_column(
            "username",
            (1..=20).map(|i| {
                if i % 5 == 0 {
                    Value::Null
                } else {
                    Value::Text(format!("user_{i}"))
                }
            }),
        )
        .with_column(
            "age",
            (1..=20).map(|i| if i % 10 == 0 { None } else { Some(i % 100 + 12) }),
        );

    let columns = vec![
        ColumnConfig::new("username", "string")
            .rule("starts_with", "user_")
            .rule("not_eq", "user_13"),
        ColumnConfig::new("age", "integer")
            .rule("gt_eq", 18)
            .rule("between", json!([0, 120])),
    ];

    let report = Analyzer::new().analyze(&table, &columns).await?;

    println!("=== Compact JSON ===");
    println!("{}", JsonFormatter::new().with_pretty(false).format(&report)?);

    println!("\n=== Console ===");
    println!("{}", HumanFormatter::new().format(&report)?);

    println!("\n=== Console (minimal, CI) ===");
    let minimal = HumanFormatter::with_config(FormatterConfig::minimal());
    println!("{}", minimal.format(&report)?);

    println!("\n=== Markdown ===");
    let markdown = MarkdownFormatter::with_config(FormatterConfig::default().with_top_values(false))
        .with_heading_level(1);
    println!("{}", markdown.format(&report)?);

    Ok(())
}
