//! End-to-end analysis runs: report contents, JSON shape and error handling.

mod common;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use common::{batch_of, Backends};
use datafusion::prelude::{CsvReadOptions, SessionContext};
use dq_guard::prelude::*;
use serde_json::json;

fn orders_backends() -> Backends {
    Backends::new(batch_of(vec![
        (
            "order_id",
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])) as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec![
                Some("Oslo"),
                Some("Bergen"),
                Some("Oslo"),
                None,
                Some("Trondheim"),
                Some("Oslo"),
            ])) as ArrayRef,
        ),
        (
            "amount",
            Arc::new(Float64Array::from(vec![
                Some(5.0),
                Some(15.0),
                None,
                Some(30.0),
                Some(40.0),
                Some(10.0),
            ])) as ArrayRef,
        ),
    ]))
}

fn orders_config() -> Vec<ColumnConfig> {
    ColumnConfig::list_from_json_str(
        r#"[
            {"name": "city", "datatype": "string", "constraints": [
                {"name": "is_in", "values": ["Oslo", "Bergen"], "severity": "high"},
                {"name": "regex", "values": "[A-Z][a-z]+"}
            ]},
            {"name": "amount", "datatype": "number", "constraints": [
                {"name": "lt", "values": 35},
                {"name": "gt_eq", "values": 5}
            ]},
            {"name": "order_id", "datatype": "integer"}
        ]"#,
    )
    .unwrap()
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("statistic should be defined");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_full_report_on_both_backends() {
    let backends = orders_backends();
    let (memory, sql) = backends.analyze(&orders_config()).await;

    for report in [memory.unwrap(), sql.unwrap()] {
        assert_eq!(report.len(), 3);
        assert!(!report.all_passed());

        let city = report.column("city").unwrap();
        assert_eq!(city.total_count, 6);
        assert_eq!(city.null_count, 1);
        assert_eq!(city.unique_count, 3);
        assert_eq!(city.topn_values.get("Oslo"), Some(3));
        assert_eq!(city.topn_values.iter().next(), Some(("Oslo", 3)));
        assert_eq!(city.topn_values.len(), 3);
        assert!(city.numeric.is_none());
        assert_eq!(city.quality_score, 0.0);

        let is_in = city.constraint("is_in").unwrap();
        assert_eq!(is_in.invalid_count, 1);
        assert_eq!(is_in.invalid_values, vec![Value::from("Trondheim")]);
        assert_eq!(is_in.extra.get("severity"), Some(&json!("high")));
        assert!(city.constraint("regex").unwrap().constraint_status.is_success());

        let amount = report.column("amount").unwrap();
        assert_eq!(amount.null_count, 1);
        assert_eq!(amount.unique_count, 5);
        let summary = amount.numeric.as_ref().unwrap();
        assert_close(summary.min, 5.0);
        assert_close(summary.max, 40.0);
        assert_close(summary.mean, 20.0);
        assert_close(summary.stddev, 212.5_f64.sqrt());

        let lt = amount.constraint("lt").unwrap();
        assert_eq!(lt.invalid_count, 1);
        assert_eq!(lt.invalid_values, vec![Value::Number(40.0)]);
        assert_eq!(amount.failed_constraints().count(), 1);

        let order_id = report.column("order_id").unwrap();
        assert!(order_id.constraints.is_empty());
        assert_eq!(order_id.unique_count, 6);
        assert_close(order_id.numeric.as_ref().unwrap().mean, 3.5);
    }
}

#[tokio::test]
async fn test_json_shape() {
    let backends = orders_backends();
    let json = Analyzer::new()
        .analyze_to_json(&backends.memory, &orders_config())
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    let columns = parsed.as_array().unwrap();
    assert_eq!(columns.len(), 3);

    let city = &columns[0];
    assert_eq!(city["col_name"], "city");
    assert_eq!(city["topn_values"]["Oslo"], 3);
    assert!(city.get("min").is_none());
    assert_eq!(city["quality_score"], 0.0);
    assert_eq!(
        city["constraints"][0],
        json!({
            "name": "is_in",
            "values": ["Oslo", "Bergen"],
            "severity": "high",
            "constraint_status": "failed",
            "invalid_count": 1,
            "invalid_values": ["Trondheim"]
        })
    );

    let amount = &columns[1];
    assert_eq!(amount["min"], 5.0);
    assert_eq!(amount["max"], 40.0);
    assert_eq!(amount["constraints"][1]["constraint_status"], "success");
    assert_eq!(amount["constraints"][1]["invalid_values"], json!([]));
}

#[tokio::test]
async fn test_top_n_and_sample_limit_are_configurable() {
    let backends = orders_backends();
    let analyzer = Analyzer::with_config(
        AnalyzerConfig::default().with_top_n(1).with_sample_limit(2),
    );
    let columns = vec![ColumnConfig::new("amount", "number").rule("gt", 100)];

    for report in [
        analyzer.analyze(&backends.memory, &columns).await.unwrap(),
        analyzer.analyze(&backends.sql, &columns).await.unwrap(),
    ] {
        let amount = &report.columns()[0];
        assert_eq!(amount.topn_values.len(), 1);
        assert_eq!(amount.constraints[0].invalid_count, 5);
        assert_eq!(amount.constraints[0].invalid_values.len(), 2);
    }
}

#[tokio::test]
async fn test_configuration_errors() {
    let backends = orders_backends();
    let cases = vec![
        ColumnConfig::new("amount", "number").rule("regex", "[0-9]+"),
        ColumnConfig::new("amount", "number").rule("between", 5),
        ColumnConfig::new("city", "string").rule("regex", json!(["a"])),
        ColumnConfig::new("city", "timestamp"),
        ColumnConfig::new("city", "string").rule("lt", 1).rule("lt", 2),
    ];

    for column in cases {
        let columns = vec![column];
        let (memory, sql) = backends.analyze(&columns).await;
        for err in [memory.unwrap_err(), sql.unwrap_err()] {
            assert!(err.is_configuration_error(), "unexpected error: {err}");
        }
    }
}

#[tokio::test]
async fn test_error_kinds() {
    let backends = orders_backends();

    let columns = vec![ColumnConfig::new("amount", "number").rule("regex", "[0-9]+")];
    let err = Analyzer::new()
        .analyze(&backends.memory, &columns)
        .await
        .unwrap_err();
    assert!(matches!(err, QualityError::UnsupportedRule { ref rule, .. } if rule == "regex"));

    let columns = vec![ColumnConfig::new("amount", "number").rule("between", "low")];
    let err = Analyzer::new()
        .analyze(&backends.sql, &columns)
        .await
        .unwrap_err();
    assert!(matches!(err, QualityError::MalformedConstraintValues { .. }));

    let columns = vec![ColumnConfig::new("city", "date")];
    let err = Analyzer::new()
        .analyze(&backends.memory, &columns)
        .await
        .unwrap_err();
    assert!(matches!(err, QualityError::UnsupportedDatatype { ref datatype } if datatype == "date"));
}

#[tokio::test]
async fn test_first_error_aborts_the_run() {
    let backends = orders_backends();
    let columns = vec![
        ColumnConfig::new("city", "string").rule("eq", "Oslo"),
        ColumnConfig::new("ghost", "string"),
        ColumnConfig::new("amount", "number"),
    ];
    let (memory, sql) = backends.analyze(&columns).await;
    assert!(matches!(memory, Err(QualityError::ColumnNotFound { .. })));
    assert!(matches!(sql, Err(QualityError::ColumnNotFound { .. })));
}

#[tokio::test]
async fn test_csv_table() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("inventory.csv");
    std::fs::write(
        &path,
        "sku,qty\nABC-1,3\nabc-2,12\nXYZ-30,7\nQRS-4,0\n",
    )
    .unwrap();

    let ctx = SessionContext::new();
    ctx.register_csv(
        "inventory",
        path.to_string_lossy().as_ref(),
        CsvReadOptions::new(),
    )
    .await
    .unwrap();
    let source = DataFusionSource::new(ctx, "inventory").unwrap();

    let columns = vec![
        ColumnConfig::new("sku", "string").rule("regex", r"[A-Z]{3}-\d+"),
        ColumnConfig::new("qty", "integer").rule("between", json!([1, 10])),
    ];
    let report = Analyzer::new().analyze(&source, &columns).await.unwrap();

    let sku = report.column("sku").unwrap();
    assert_eq!(sku.total_count, 4);
    assert_eq!(sku.constraints[0].invalid_values, vec![Value::from("abc-2")]);

    let qty = report.column("qty").unwrap();
    assert_eq!(qty.constraints[0].invalid_count, 2);
    assert_close(qty.numeric.as_ref().unwrap().max, 12.0);
}

#[tokio::test]
async fn test_sample_follows_scan_order_across_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    for part in 0..3 {
        let rows: String = (0..5)
            .map(|row| format!("{}\n", part * 5 + row))
            .collect();
        std::fs::write(
            temp_dir.path().join(format!("part-{part}.csv")),
            format!("reading\n{rows}"),
        )
        .unwrap();
    }

    let ctx = SessionContext::new_with_config(
        datafusion::prelude::SessionConfig::new().with_target_partitions(4),
    );
    ctx.register_csv(
        "readings",
        temp_dir.path().to_string_lossy().as_ref(),
        CsvReadOptions::new(),
    )
    .await
    .unwrap();
    let source = DataFusionSource::new(ctx, "readings").unwrap();

    let columns = vec![ColumnConfig::new("reading", "integer").rule("gt", 100)];
    let report = Analyzer::new().analyze(&source, &columns).await.unwrap();
    let result = &report.columns()[0].constraints[0];

    assert_eq!(result.invalid_count, 15);
    let expected: Vec<Value> = (0..10).map(Value::Integer).collect();
    assert_eq!(result.invalid_values, expected);
}
