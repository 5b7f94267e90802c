//! Basic analysis example: one column configuration, two backends.
//!
//! This example shows how to:
//! - Register a CSV file in DataFusion and analyze it through `DataFusionSource`
//! - Load the same rows into a `MemoryTable` and analyze them again
//! - Read constraint outcomes and statistics from the report
//!
//! Run with:
//! ```bash
//! cargo run --example basic_analysis
//! ```

use datafusion::prelude::*;
use dq_guard::logging::setup::{init_logging, LoggingConfig};
use dq_guard::prelude::*;

const COLUMNS: &str = r#"[
    {
        "name": "customer_id",
        "datatype": "integer",
        "constraints": [{"name": "gt", "values": 0}]
    },
    {
        "name": "email",
        "datatype": "string",
        "constraints": [
            {"name": "regex", "values": "[^@]+@[^@]+\\.[a-z]+"},
            {"name": "not_contains", "values": " "}
        ]
    },
    {
        "name": "country",
        "datatype": "string",
        "constraints": [{"name": "is_in", "values": ["NO", "SE", "DK"]}]
    },
    {
        "name": "purchase_amount",
        "datatype": "number",
        "constraints": [
            {"name": "between", "values": [0, 500]},
            {"name": "not_eq", "values": 0}
        ]
    }
]"#;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default())?;

    let csv_data = r#"customer_id,email,country,purchase_amount
1,alice@example.com,NO,150.50
2,bob@example,SE,200.00
3,carol@example.com,DK,75.25
4,david wilson@example.com,FI,300.00
5,eve@example.com,NO,
6,,SE,980.00
7,grace@example.com,None,0
8,henry@example.com,NO,220.50"#;

    let temp_dir = tempfile::tempdir()?;
    let file_path = temp_dir.path().join("customers.csv");
    std::fs::write(&file_path, csv_data)?;

    let ctx = SessionContext::new();
    ctx.register_csv(
        "customers",
        file_path.to_string_lossy().as_ref(),
        CsvReadOptions::default(),
    )
    .await?;

    let columns = ColumnConfig::list_from_json_str(COLUMNS)?;
    let analyzer = Analyzer::with_config(
        AnalyzerConfig::default().with_log_config(LogConfig::verbose()),
    );

    println!("Analyzing customers.csv through DataFusion...\n");
    let sql_source = DataFusionSource::new(ctx.clone(), "customers")?;
    let sql_report = analyzer.analyze(&sql_source, &columns).await?;
    print_summary(&sql_report);

    println!("\nAnalyzing the same rows in memory...\n");
    let batches = ctx.table("customers").await?.collect().await?;
    let table = MemoryTable::from_record_batches(&batches)?;
    let memory_report = analyzer.analyze(&table, &columns).await?;
    print_summary(&memory_report);

    let same = sql_report
        .columns()
        .iter()
        .zip(memory_report.columns())
        .all(|(a, b)| {
            a.null_count == b.null_count
                && a.constraints
                    .iter()
                    .zip(&b.constraints)
                    .all(|(x, y)| x.invalid_count == y.invalid_count)
        });
    println!("\nBackends agree on counts: {same}");

    println!("\nFull report:\n{}", sql_report.to_json_pretty()?);
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    for column in report.columns() {
        println!(
            "{:<16} rows={} nulls={} distinct={}",
            column.col_name, column.total_count, column.null_count, column.unique_count
        );
        for result in &column.constraints {
            let marker = if result.constraint_status.is_success() {
                "ok"
            } else {
                "FAILED"
            };
            println!(
                "    {:<14} {:<28} {marker} ({} invalid, e.g. {:?})",
                result.name,
                result.values.to_string(),
                result.invalid_count,
                result
                    .invalid_values
                    .iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
            );
        }
    }
}
