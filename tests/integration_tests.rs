//! Integration tests
//!
//! Tests the full end-to-end flow: YAML config → JSON document → Parquet files

use arrow::array::{Array, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use json2parquet::loader::load_config_from_str;
use json2parquet::pipeline::run_pipeline;
use json2parquet::{FlattenEngine, ParseConfig};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::reader::{FileReader, SerializedFileReader};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs::File;
use std::path::Path;
use tempfile::tempdir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(yaml: &str, out: &Path) -> ParseConfig {
    load_config_from_str(yaml).unwrap().with_output_path(out)
}

fn read_all(path: &Path) -> Vec<RecordBatch> {
    ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
        .unwrap()
        .build()
        .unwrap()
        .map(|b| b.unwrap())
        .collect()
}

fn single_batch(path: &Path) -> RecordBatch {
    let batches = read_all(path);
    let schema = batches[0].schema();
    arrow::compute::concat_batches(&schema, &batches).unwrap()
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<String> {
    let column = batch.column_by_name(name).unwrap();
    let array = column.as_any().downcast_ref::<StringArray>().unwrap();
    (0..array.len()).map(|i| array.value(i).to_string()).collect()
}

fn ints(batch: &RecordBatch, name: &str) -> Vec<i64> {
    let column = batch.column_by_name(name).unwrap();
    let array = column.as_any().downcast_ref::<Int64Array>().unwrap();
    array.values().to_vec()
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[test]
fn test_root_table_from_single_object() {
    let yaml = r#"
source: {path: in.json}
output_path: out
tables:
  - name: orders
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));

    engine.parse_value(&json!({"id": 7})).unwrap();

    let batch = single_batch(&dir.path().join("orders.parquet"));
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(ints(&batch, "id"), vec![7]);
}

#[test]
fn test_items_inherit_order_id() {
    let yaml = r#"
source: {path: in.json}
output_path: out
tables:
  - name: items
    json_path: orders.items
    parent_refs:
      - entity_name: order
        fields:
          - {name: order_id, json_path: id, type: int64}
    fields:
      - {name: sku, json_path: sku, type: string}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));
    let doc = json!({"orders": [{"id": 1, "items": [{"sku": "A"}, {"sku": "B"}]}]});

    engine.parse_value(&doc).unwrap();

    let batch = single_batch(&dir.path().join("items.parquet"));
    let names: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, vec!["order_id", "sku"]);
    assert_eq!(ints(&batch, "order_id"), vec![1, 1]);
    assert_eq!(strings(&batch, "sku"), vec!["A", "B"]);
}

#[test]
fn test_default_value_and_coercion_fallbacks() {
    let yaml = r#"
source: {path: in.json}
output_path: out
tables:
  - name: rows
    json_path: rows
    fields:
      - {name: qty, json_path: qty, type: int64, default_value: "0"}
      - {name: label, json_path: label, type: string, default_value: "none"}
      - {name: price, json_path: price, type: float64}
      - {name: active, json_path: active, type: bool}
      - {name: meta, json_path: meta, type: string}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));
    let doc = json!({"rows": [
        {"qty": 3.9, "label": "x", "price": 2, "active": true, "meta": {"a": 1}},
        {"price": "cheap", "active": "yes", "meta": 12}
    ]});

    engine.parse_value(&doc).unwrap();

    let batch = single_batch(&dir.path().join("rows.parquet"));
    assert_eq!(ints(&batch, "qty"), vec![3, 0]);
    assert_eq!(strings(&batch, "label"), vec!["x", "none"]);
    assert_eq!(strings(&batch, "meta"), vec![r#"{"a":1}"#, "12"]);

    let price = batch.column_by_name("price").unwrap();
    let price = price.as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(price.values().to_vec(), vec![2.0, 0.0]);

    let active = batch.column_by_name("active").unwrap();
    let active = active.as_any().downcast_ref::<BooleanArray>().unwrap();
    assert!(active.value(0));
    assert!(!active.value(1));
}

#[test]
fn test_skips_non_object_elements() {
    let yaml = r#"
source: {path: in.json}
output_path: out
tables:
  - name: things
    json_path: things
    fields:
      - {name: a, json_path: a, type: int64}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));

    let stats = engine
        .parse_value(&json!({"things": [{"a": 1}, 5, {"a": 2}]}))
        .unwrap();

    assert_eq!(stats.rows_for("things"), 2);
    assert_eq!(stats.skipped_elements, 1);
    assert_eq!(ints(&single_batch(&dir.path().join("things.parquet")), "a"), vec![1, 2]);
}

#[test]
fn test_deep_hierarchy_with_user_alias() {
    let yaml = r#"
source: {path: in.json, root_array: users}
output_path: out
tables:
  - name: users
    json_path: ""
    fields:
      - {name: user_id, json_path: id, type: int64}
      - {name: city, json_path: address.city, type: string}
  - name: projects
    json_path: projects
    parent_refs:
      - entity_name: user
        fields:
          - {name: user_id, json_path: id, type: int64}
    fields:
      - {name: project, json_path: name, type: string}
  - name: tasks
    json_path: tasks
    parent_refs:
      - entity_name: project
        fields:
          - {name: project, json_path: name, type: string}
    fields:
      - {name: task, json_path: title, type: string}
      - {name: done, json_path: done, type: bool}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));
    let doc = json!({"users": [
        {"id": 1, "address": {"city": "Oslo"}, "projects": [
            {"name": "p1", "tasks": [{"title": "t1", "done": true}, {"title": "t2"}]}
        ]},
        {"id": 2, "address": null, "projects": [
            {"name": "p2", "tasks": [{"title": "t3"}]},
            {"name": "p3"}
        ]}
    ]});

    let stats = engine.parse_value(&doc).unwrap();

    assert_eq!(stats.rows_for("users"), 2);
    assert_eq!(stats.rows_for("projects"), 3);
    assert_eq!(stats.rows_for("tasks"), 3);

    let users = single_batch(&dir.path().join("users.parquet"));
    assert_eq!(strings(&users, "city"), vec!["Oslo", ""]);

    let projects = single_batch(&dir.path().join("projects.parquet"));
    assert_eq!(ints(&projects, "user_id"), vec![1, 2, 2]);

    let tasks = single_batch(&dir.path().join("tasks.parquet"));
    assert_eq!(strings(&tasks, "project"), vec!["p1", "p1", "p2"]);
    assert_eq!(strings(&tasks, "task"), vec!["t1", "t2", "t3"]);
}

// ============================================================================
// Writer Configuration
// ============================================================================

#[test]
fn test_rotation_from_config() {
    let yaml = r#"
source: {path: in.json}
output_path: out
compression: zstd
writer:
  max_rows_per_file: 2
  batch_size: 1
tables:
  - name: mrf
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));

    let stats = engine
        .parse_value(&json!([{"id": 1}, {"id": 2}, {"id": 3}]))
        .unwrap();

    let first = dir.path().join("mrf_0000.zstd.parquet");
    let second = dir.path().join("mrf_0001.zstd.parquet");
    assert_eq!(stats.files.len(), 2);
    assert_eq!(ints(&single_batch(&first), "id"), vec![1, 2]);
    assert_eq!(ints(&single_batch(&second), "id"), vec![3]);

    let reader = SerializedFileReader::new(File::open(&first).unwrap()).unwrap();
    let column = reader.metadata().row_group(0).column(0);
    assert!(matches!(column.compression(), Compression::ZSTD(_)));
}

#[test]
fn test_rotation_limit_holds_with_default_batch_size() {
    let yaml = r#"
source: {path: in.json}
output_path: out
writer:
  max_rows_per_file: 2
tables:
  - name: mrf
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));
    let records: Vec<_> = (1..=5).map(|id| json!({ "id": id })).collect();

    let stats = engine.parse_value(&json!(records)).unwrap();

    let rows: Vec<usize> = stats.files.iter().map(|f| f.rows).collect();
    assert_eq!(rows, vec![2, 2, 1]);
    assert!(stats.files.iter().all(|f| f.rows <= 2));
    assert_eq!(ints(&single_batch(&dir.path().join("mrf_0001.none.parquet")), "id"), vec![3, 4]);
    assert_eq!(ints(&single_batch(&dir.path().join("mrf_0002.none.parquet")), "id"), vec![5]);
}

#[test]
fn test_pipelined_writers_match_direct() {
    let yaml = r#"
source: {path: in.json, root_array: data}
output_path: out
writer:
  pipelined: true
  channel_capacity: 1
  batch_size: 7
tables:
  - name: parents
    json_path: ""
    fields:
      - {name: id, json_path: id, type: int64}
  - name: children
    json_path: children
    parent_refs:
      - entity_name: user
        fields:
          - {name: parent_id, json_path: id, type: int64}
    fields:
      - {name: n, json_path: n, type: int64}
"#;
    let records: Vec<_> = (0..50)
        .map(|i| json!({"id": i, "children": [{"n": i * 10}, {"n": i * 10 + 1}]}))
        .collect();
    let doc = json!({ "data": records });
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));

    let stats = engine.parse_value(&doc).unwrap();

    assert_eq!(stats.rows_for("parents"), 50);
    assert_eq!(stats.rows_for("children"), 100);
    let children = single_batch(&dir.path().join("children.parquet"));
    let parent_ids = ints(&children, "parent_id");
    assert_eq!(parent_ids.len(), 100);
    assert_eq!(&parent_ids[..4], &[0, 0, 1, 1]);
}

#[test]
fn test_schema_metadata_in_file() {
    let yaml = r#"
source: {path: in.json}
output_path: out
tables:
  - name: items
    json_path: items
    parent_refs:
      - entity_name: user
        fields:
          - {name: owner, json_path: id, type: int64}
    fields:
      - {name: sku, json_path: detail.sku, type: string, required: true}
"#;
    let dir = tempdir().unwrap();
    let engine = FlattenEngine::new(config(yaml, dir.path()));

    engine
        .parse_value(&json!({"id": 3, "items": [{"detail": {"sku": "Z"}}]}))
        .unwrap();

    let file = File::open(dir.path().join("items.parquet")).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let schema = builder.schema().clone();
    assert_eq!(schema.metadata().get("table"), Some(&"items".to_string()));
    let owner = schema.field_with_name("owner").unwrap().metadata();
    assert_eq!(owner.get("source"), Some(&"parent:user".to_string()));
    let sku = schema.field_with_name("sku").unwrap().metadata();
    assert_eq!(sku.get("json_path"), Some(&"detail.sku".to_string()));
    assert_eq!(sku.get("required"), Some(&"true".to_string()));
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_pipeline_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"[{"id": 1}, {"id": 2}, "bad"]"#),
        )
        .mount(&server)
        .await;

    let yaml = format!(
        r#"
source:
  type: url
  path: {}/dump.json
output_path: out
fetch:
  max_retries: 2
  initial_backoff_ms: 1
tables:
  - name: ids
    json_path: ""
    fields:
      - {{name: id, json_path: id, type: int64}}
"#,
        server.uri()
    );
    let dir = tempdir().unwrap();

    let stats = run_pipeline(config(&yaml, dir.path())).await.unwrap();

    assert_eq!(stats.root_records, 3);
    assert_eq!(stats.skipped_roots, 1);
    assert_eq!(ints(&single_batch(&dir.path().join("ids.parquet")), "id"), vec![1, 2]);
}
