//! Tests for engine module

use super::*;
use crate::loader::{load_config_from_str, ParseConfig};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs::File;
use tempfile::{tempdir, TempDir};

fn config(yaml: &str, dir: &TempDir) -> ParseConfig {
    load_config_from_str(yaml)
        .unwrap()
        .with_output_path(dir.path().join("out"))
}

fn count_rows(path: &Path) -> usize {
    ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
        .unwrap()
        .build()
        .unwrap()
        .map(|b| b.unwrap().num_rows())
        .sum()
}

const ORDERS_YAML: &str = r#"
source:
  path: input.json
output_path: out
tables:
  - name: orders
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
"#;

const ITEMS_YAML: &str = r#"
source:
  path: input.json
  root_array: orders
output_path: out
tables:
  - name: orders
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
  - name: items
    json_path: items
    parent_refs:
      - entity_name: user
        fields:
          - {name: order_id, json_path: id, type: int64}
    fields:
      - {name: sku, json_path: sku, type: string}
"#;

// ============================================================================
// Root Record Tests
// ============================================================================

#[test]
fn test_root_records_array() {
    let doc = json!([{"a": 1}, {"a": 2}]);
    assert_eq!(root_records(&doc, None).unwrap().len(), 2);
    assert_eq!(root_records(&doc, Some("ignored")).unwrap().len(), 2);
}

#[test]
fn test_root_records_single_object() {
    let doc = json!({"id": 7});
    let roots = root_records(&doc, None).unwrap();
    assert_eq!(roots, &[json!({"id": 7})]);
}

#[test]
fn test_root_records_named_array() {
    let doc = json!({"meta": {}, "data": [{"id": 1}, {"id": 2}, {"id": 3}]});
    assert_eq!(root_records(&doc, Some("data")).unwrap().len(), 3);
}

#[test]
fn test_root_records_named_field_not_array() {
    let doc = json!({"data": {"id": 1}});
    let err = root_records(&doc, Some("data")).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("not an array"));
}

#[test]
fn test_root_records_named_field_missing() {
    let doc = json!({"other": []});
    assert!(matches!(
        root_records(&doc, Some("data")),
        Err(Error::Config { .. })
    ));
}

#[test]
fn test_root_records_scalar_root() {
    assert!(matches!(
        root_records(&json!(5), None),
        Err(Error::Config { .. })
    ));
    assert!(matches!(
        root_records(&json!("x"), None),
        Err(Error::Config { .. })
    ));
}

// ============================================================================
// Engine Tests
// ============================================================================

#[test]
fn test_single_root_object() {
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(ORDERS_YAML, &dir));

    let stats = engine.parse_value(&json!({"id": 7})).unwrap();

    assert_eq!(stats.root_records, 1);
    assert_eq!(stats.rows_for("orders"), 1);
    assert_eq!(count_rows(&dir.path().join("out/orders.parquet")), 1);
}

#[test]
fn test_nested_tables_with_root_array() {
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(ITEMS_YAML, &dir));
    let doc = json!({"orders": [
        {"id": 1, "items": [{"sku": "A"}, {"sku": "B"}]},
        {"id": 2, "items": []},
        "not an object",
        {"id": 3, "items": [{"sku": "C"}, 4]}
    ]});

    let stats = engine.parse_value(&doc).unwrap();

    assert_eq!(stats.root_records, 4);
    assert_eq!(stats.skipped_roots, 1);
    assert_eq!(stats.rows_for("orders"), 3);
    assert_eq!(stats.rows_for("items"), 3);
    assert_eq!(stats.skipped_elements, 1);
    assert_eq!(stats.rows_written, 6);
    assert_eq!(stats.files.len(), 2);
}

#[test]
fn test_empty_table_creates_no_file() {
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(ITEMS_YAML, &dir));

    let stats = engine.parse_value(&json!({"orders": [{"id": 1}]})).unwrap();

    assert_eq!(stats.rows_for("items"), 0);
    assert!(stats.rows_per_table.contains_key("items"));
    assert!(!dir.path().join("out/items.parquet").exists());
}

#[test]
fn test_bad_root_fails_before_writing() {
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(ITEMS_YAML, &dir));

    let err = engine.parse_value(&json!({"orders": {"id": 1}})).unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_parse_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.json");
    std::fs::write(&input, r#"[{"id": 1}, {"id": 2}]"#).unwrap();
    let engine = FlattenEngine::new(config(ORDERS_YAML, &dir));

    let stats = engine.parse_file(&input).unwrap();

    assert_eq!(stats.rows_for("orders"), 2);
}

#[test]
fn test_parse_file_missing() {
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(ORDERS_YAML, &dir));

    let err = engine.parse_file(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_parse_file_invalid_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.json");
    std::fs::write(&input, "{not json").unwrap();
    let engine = FlattenEngine::new(config(ORDERS_YAML, &dir));

    assert!(matches!(
        engine.parse_file(&input),
        Err(Error::JsonParse(_))
    ));
}

#[test]
fn test_run_stats_serialize() {
    let mut stats = RunStats::new();
    stats.rows_per_table.insert("orders".to_string(), 2);
    stats.rows_written = 2;

    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["rows_per_table"]["orders"], json!(2));
    assert_eq!(value["rows_written"], json!(2));
}

// ============================================================================
// Write Failure Tests
// ============================================================================

fn two_orders() -> Value {
    json!({"orders": [
        {"id": 1, "items": [{"sku": "A"}]},
        {"id": 2, "items": [{"sku": "B"}]}
    ]})
}

/// Occupy the items table's output path with a directory so opening it fails
fn block_items_file(dir: &TempDir) {
    std::fs::create_dir_all(dir.path().join("out").join("items.parquet")).unwrap();
}

fn assert_items_failed(err: &Error) {
    assert!(
        matches!(err, Error::Write { table, .. } if table == "items"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_write_failure_mid_run_closes_other_writers() {
    let dir = tempdir().unwrap();
    block_items_file(&dir);
    let mut config = config(ITEMS_YAML, &dir);
    config.writer.batch_size = 1;
    let engine = FlattenEngine::new(config);

    let err = engine.parse_value(&two_orders()).unwrap_err();

    assert_items_failed(&err);
    let orders = dir.path().join("out").join("orders.parquet");
    assert_eq!(count_rows(&orders), 1);
}

#[test]
fn test_write_failure_at_close_still_flushes_other_tables() {
    let dir = tempdir().unwrap();
    block_items_file(&dir);
    let engine = FlattenEngine::new(config(ITEMS_YAML, &dir));

    let err = engine.parse_value(&two_orders()).unwrap_err();

    assert_items_failed(&err);
    let orders = dir.path().join("out").join("orders.parquet");
    assert_eq!(count_rows(&orders), 2);
}

#[test]
fn test_write_failure_in_pipelined_writer() {
    let dir = tempdir().unwrap();
    block_items_file(&dir);
    let mut config = config(ITEMS_YAML, &dir);
    config.writer.batch_size = 1;
    config.writer.pipelined = true;
    config.writer.channel_capacity = 1;
    let engine = FlattenEngine::new(config);

    let err = engine.parse_value(&two_orders()).unwrap_err();

    assert_items_failed(&err);
    let orders = dir.path().join("out").join("orders.parquet");
    assert!(count_rows(&orders) >= 1);
}
