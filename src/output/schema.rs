//! Schema synthesis and row encoding
//!
//! Builds a table's columnar schema directly from its configuration and
//! encodes flat rows into Arrow RecordBatches against it.

use crate::error::{Error, Result};
use crate::flatten::{FlatRecord, Scalar};
use crate::loader::TableConfig;
use crate::types::ScalarKind;
use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Metadata key for a column's source path
pub const META_JSON_PATH: &str = "json_path";
/// Metadata key for where a column's value comes from (`self` or `parent:<entity>`)
pub const META_SOURCE: &str = "source";
/// Metadata key for the configured physical type hint
pub const META_PARQUET_TYPE: &str = "parquet_type";
/// Metadata key for the configured required flag
pub const META_REQUIRED: &str = "required";
/// Schema-level metadata key holding the table name
pub const META_TABLE: &str = "table";

/// One physical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ScalarKind,
    /// Always true; coercion guarantees a value, the physical layer doesn't care
    pub nullable: bool,
    /// Position in the effective field list
    pub index: usize,
    pub json_path: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parquet_type: Option<String>,
    pub required: bool,
}

impl ColumnDescriptor {
    fn to_field(&self) -> Field {
        let mut metadata = HashMap::from([
            (META_JSON_PATH.to_string(), self.json_path.clone()),
            (META_SOURCE.to_string(), self.source.clone()),
        ]);
        if let Some(parquet_type) = &self.parquet_type {
            metadata.insert(META_PARQUET_TYPE.to_string(), parquet_type.clone());
        }
        if self.required {
            metadata.insert(META_REQUIRED.to_string(), "true".to_string());
        }

        Field::new(&self.name, self.kind.data_type(), self.nullable).with_metadata(metadata)
    }
}

/// Ordered column layout of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in physical order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Arrow schema with column and table metadata
    pub fn to_arrow(&self) -> Schema {
        let fields: Vec<Field> = self.columns.iter().map(ColumnDescriptor::to_field).collect();
        let metadata = HashMap::from([(META_TABLE.to_string(), self.table.clone())]);
        Schema::new_with_metadata(fields, metadata)
    }

    /// Shared Arrow schema
    pub fn arrow_ref(&self) -> SchemaRef {
        Arc::new(self.to_arrow())
    }
}

/// Synthesize the schema for a table
///
/// Parent-ref fields come first, in declaration order, followed by the
/// table's own fields.
pub fn synthesize(table: &TableConfig) -> TableSchema {
    let parent_columns = table.parent_refs.iter().flat_map(|parent_ref| {
        let source = format!("parent:{}", parent_ref.entity_name);
        parent_ref
            .fields
            .iter()
            .map(move |field| (field, source.clone()))
    });
    let own_columns = table.fields.iter().map(|field| (field, "self".to_string()));

    let columns = parent_columns
        .chain(own_columns)
        .enumerate()
        .map(|(index, (field, source))| ColumnDescriptor {
            name: field.name.clone(),
            kind: field.field_type,
            nullable: true,
            index,
            json_path: field.json_path.clone(),
            source,
            parquet_type: field.parquet_type.clone(),
            required: field.required,
        })
        .collect();

    TableSchema {
        table: table.name.clone(),
        columns,
    }
}

/// Encode rows into a RecordBatch matching `schema`
///
/// Columns missing from a row (an unbound ancestor) take the zero value of
/// their kind.
pub fn rows_to_batch(schema: &TableSchema, arrow_schema: SchemaRef, rows: &[FlatRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .columns
        .iter()
        .map(|column| build_column(column, rows))
        .collect();

    RecordBatch::try_new(arrow_schema, columns).map_err(|e| {
        Error::write(&schema.table, format!("Failed to create RecordBatch: {e}"))
    })
}

fn build_column(column: &ColumnDescriptor, rows: &[FlatRecord]) -> ArrayRef {
    let values = rows.iter().map(|row| row.value_or_zero(&column.name, column.kind));

    match column.kind {
        ScalarKind::String => {
            let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for value in values {
                match value {
                    Scalar::String(s) => builder.append_value(s),
                    _ => builder.append_value(""),
                }
            }
            Arc::new(builder.finish())
        }
        ScalarKind::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for value in values {
                builder.append_value(value.as_i64().unwrap_or_default());
            }
            Arc::new(builder.finish())
        }
        ScalarKind::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for value in values {
                builder.append_value(value.as_f64().unwrap_or_default());
            }
            Arc::new(builder.finish())
        }
        ScalarKind::Bool => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for value in values {
                builder.append_value(value.as_bool().unwrap_or_default());
            }
            Arc::new(builder.finish())
        }
    }
}
