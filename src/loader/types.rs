//! Loader types
//!
//! Declarative flattening configuration types for YAML parsing.

use crate::types::{BackoffType, CompressionCodec, ScalarKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default rows per Parquet row group
pub const DEFAULT_ROWS_PER_GROUP: usize = 1024 * 1024;

// ============================================================================
// Parse Config
// ============================================================================

/// Top-level flattening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParseConfig {
    /// Where the JSON document comes from
    pub source: SourceConfig,
    /// Table definitions, in declaration order
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    /// Output directory for Parquet files
    #[serde(default)]
    pub output_path: PathBuf,
    /// Compression codec for every table
    #[serde(default)]
    pub compression: CompressionCodec,
    /// Legacy rows-per-group setting; `writer.max_rows_per_group` wins when both are set
    #[serde(default)]
    pub row_group: Option<usize>,
    /// Writer tuning
    #[serde(default)]
    pub writer: WriterDefinition,
    /// Remote fetch tuning
    #[serde(default)]
    pub fetch: FetchDefinition,
}

impl ParseConfig {
    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Effective rows per row group
    pub fn rows_per_group(&self) -> usize {
        self.writer
            .max_rows_per_group
            .or(self.row_group)
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_ROWS_PER_GROUP)
    }

    /// Replace the source path
    #[must_use]
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source.path = path.into();
        self
    }

    /// Replace the output directory
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }
}

// ============================================================================
// Source
// ============================================================================

/// Source document definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Source type hint: file, http, https, url, s3, gs, az
    #[serde(rename = "type", default)]
    pub source_type: String,
    /// Local path or URL
    #[serde(default)]
    pub path: String,
    /// Field holding the root records when the document root is an object
    #[serde(default)]
    pub root_array: Option<String>,
    /// Field naming the entity type of a record (carried, unused)
    #[serde(default)]
    pub type_field: Option<String>,
}

impl SourceConfig {
    /// Root array field, if one is configured
    pub fn root_array(&self) -> Option<&str> {
        self.root_array.as_deref().filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Tables
// ============================================================================

/// One output table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableConfig {
    /// Table name, also the output file stem
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Dot-separated path from the current scope; empty means root level
    #[serde(default)]
    pub json_path: String,
    /// Own columns, in physical order
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Columns inherited from ancestor entities, placed before own columns
    #[serde(default)]
    pub parent_refs: Vec<ParentRef>,
}

impl TableConfig {
    /// Create a table with no fields
    pub fn new(name: impl Into<String>, json_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            json_path: json_path.into(),
            ..Default::default()
        }
    }

    /// Add an own field
    #[must_use]
    pub fn with_field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a parent reference
    #[must_use]
    pub fn with_parent_ref(mut self, parent_ref: ParentRef) -> Self {
        self.parent_refs.push(parent_ref);
        self
    }

    /// Whether the table is filled once per root record
    pub fn is_root(&self) -> bool {
        self.json_path.is_empty()
    }

    /// Path segments of `json_path`
    pub fn path_segments(&self) -> Vec<&str> {
        self.json_path.split('.').collect()
    }

    /// Parent-ref fields followed by own fields, in declaration order
    pub fn effective_fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.parent_refs
            .iter()
            .flat_map(|r| r.fields.iter())
            .chain(self.fields.iter())
    }

    /// Number of physical columns
    pub fn column_count(&self) -> usize {
        self.parent_refs.iter().map(|r| r.fields.len()).sum::<usize>() + self.fields.len()
    }
}

/// Mapping from a JSON value to one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FieldConfig {
    /// Column name
    pub name: String,
    /// Dot-separated path relative to the record in scope
    #[serde(default)]
    pub json_path: String,
    /// Target column type
    #[serde(rename = "type", default)]
    pub field_type: ScalarKind,
    /// Physical encoding hint (carried into schema metadata)
    #[serde(default)]
    pub parquet_type: Option<String>,
    /// Required marker (carried into schema metadata)
    #[serde(default)]
    pub required: bool,
    /// Substituted when the path is absent; empty means no default
    #[serde(default)]
    pub default_value: String,
}

impl FieldConfig {
    /// Create a field mapping
    pub fn new(name: impl Into<String>, json_path: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            json_path: json_path.into(),
            field_type: kind,
            ..Default::default()
        }
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }
}

/// Fields copied from an ancestor entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParentRef {
    /// Binding name of the ancestor; `user` always means the enclosing record
    pub entity_name: String,
    /// Fields evaluated against the ancestor record
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl ParentRef {
    /// Create a parent reference
    pub fn new(entity_name: impl Into<String>, fields: Vec<FieldConfig>) -> Self {
        Self {
            entity_name: entity_name.into(),
            fields,
        }
    }
}

// ============================================================================
// Writer Definition
// ============================================================================

/// Writer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WriterDefinition {
    /// Rows per file before rotating; 0 writes a single `<table>.parquet`
    #[serde(default)]
    pub max_rows_per_file: usize,
    /// Rows per row group
    #[serde(default)]
    pub max_rows_per_group: Option<usize>,
    /// Rotated file name template (`{stem}`, `{codec}`, `%0Nd`)
    #[serde(default)]
    pub filename_template: Option<String>,
    /// Rows buffered per table before they are handed to the writer
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Flush interval in rows
    #[serde(default = "default_flush_every_rows")]
    pub flush_every_rows: usize,
    /// Run each table writer on its own channel-fed thread
    #[serde(default)]
    pub pipelined: bool,
    /// Bounded channel size per table in pipelined mode
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WriterDefinition {
    fn default() -> Self {
        Self {
            max_rows_per_file: 0,
            max_rows_per_group: None,
            filename_template: None,
            batch_size: default_batch_size(),
            flush_every_rows: default_flush_every_rows(),
            pipelined: false,
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}

fn default_flush_every_rows() -> usize {
    50_000
}

fn default_channel_capacity() -> usize {
    64
}

// ============================================================================
// Fetch Definition
// ============================================================================

/// Remote fetch tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FetchDefinition {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,
}

impl Default for FetchDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            backoff: BackoffType::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    60
}
