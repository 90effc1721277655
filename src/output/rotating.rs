//! Rotating Parquet writer
//!
//! Owns at most one open file for a table. Files are created lazily on the
//! first write and rolled over to a new, sequentially numbered file once the
//! current one holds `max_rows_per_file` rows.

use super::schema::{rows_to_batch, TableSchema};
use super::writer::{ParquetWriter, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::flatten::FlatRecord;
use crate::loader::ParseConfig;
use crate::types::CompressionCodec;
use arrow::datatypes::SchemaRef;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Default template for rotated file names
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{stem}_%04d.{codec}.parquet";

/// Matches a printf-style sequence placeholder: %d, %4d, %04d
static SEQUENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(0?)(\d*)d").unwrap());

/// Settings shared by every rotating writer of a run
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Directory receiving the files
    pub output_dir: PathBuf,
    /// Zero means a single `<stem>.parquet` file
    pub max_rows_per_file: usize,
    pub filename_template: String,
    /// Zero disables periodic flushing
    pub flush_every_rows: usize,
    pub parquet: ParquetWriterConfig,
}

impl RotationPolicy {
    /// Create a single-file policy writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_rows_per_file: 0,
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            flush_every_rows: 0,
            parquet: ParquetWriterConfig::default(),
        }
    }

    /// Policy described by a run's configuration
    pub fn from_config(config: &ParseConfig) -> Self {
        let parquet = ParquetWriterConfig::new()
            .with_codec(config.compression)
            .with_row_group_size(config.rows_per_group());

        Self {
            output_dir: config.output_path.clone(),
            max_rows_per_file: config.writer.max_rows_per_file,
            filename_template: config
                .writer
                .filename_template
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_FILENAME_TEMPLATE.to_string()),
            flush_every_rows: config.writer.flush_every_rows,
            parquet,
        }
    }

    #[must_use]
    pub fn with_max_rows_per_file(mut self, rows: usize) -> Self {
        self.max_rows_per_file = rows;
        self
    }

    #[must_use]
    pub fn with_filename_template(mut self, template: impl Into<String>) -> Self {
        self.filename_template = template.into();
        self
    }

    #[must_use]
    pub fn with_flush_every_rows(mut self, rows: usize) -> Self {
        self.flush_every_rows = rows;
        self
    }

    #[must_use]
    pub fn with_parquet(mut self, config: ParquetWriterConfig) -> Self {
        self.parquet = config;
        self
    }

    /// Whether files are rolled over
    pub fn is_rotating(&self) -> bool {
        self.max_rows_per_file > 0
    }

    /// File name for `stem` at sequence `seq`
    pub fn file_name(&self, stem: &str, seq: usize) -> String {
        if self.is_rotating() {
            render_filename(&self.filename_template, stem, self.parquet.codec(), seq)
        } else {
            format!("{stem}.parquet")
        }
    }
}

/// Expand `{stem}`, `{codec}` and a `%0Nd` sequence placeholder
pub fn render_filename(template: &str, stem: &str, codec: CompressionCodec, seq: usize) -> String {
    let named = template
        .replace("{stem}", stem)
        .replace("{codec}", codec.as_str());

    SEQUENCE_REGEX
        .replace(&named, |caps: &regex::Captures<'_>| {
            let width: usize = caps[2].parse().unwrap_or(0);
            if caps[1].is_empty() {
                format!("{seq:>width$}")
            } else {
                format!("{seq:0width$}")
            }
        })
        .into_owned()
}

/// A finished output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Final report of one table's writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriterSummary {
    pub table: String,
    pub rows: usize,
    pub files: Vec<WrittenFile>,
}

/// Rotating writer for one table
pub struct RotatingWriter {
    schema: TableSchema,
    arrow_schema: SchemaRef,
    policy: RotationPolicy,
    current: Option<ParquetWriter>,
    next_seq: usize,
    rows_since_flush: usize,
    total_rows: usize,
    files: Vec<WrittenFile>,
}

impl RotatingWriter {
    /// Create a writer; no file is opened until the first non-empty write
    pub fn new(schema: TableSchema, policy: RotationPolicy) -> Self {
        let arrow_schema = schema.arrow_ref();
        Self {
            schema,
            arrow_schema,
            policy,
            current: None,
            next_seq: 0,
            rows_since_flush: 0,
            total_rows: 0,
            files: Vec::new(),
        }
    }

    /// Table this writer serves
    pub fn table(&self) -> &str {
        &self.schema.table
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Rows accepted over the writer's lifetime
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Path of the open file, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(ParquetWriter::path)
    }

    /// Files finished so far
    pub fn files(&self) -> &[WrittenFile] {
        &self.files
    }

    /// Append a batch of rows, rotating whenever the open file reaches the limit
    ///
    /// A batch larger than the room left in the open file continues in the
    /// next file, so no file holds more than `max_rows_per_file` rows.
    pub fn write(&mut self, rows: &[FlatRecord]) -> Result<usize> {
        let mut remaining = rows;
        while !remaining.is_empty() {
            if self.current_is_full() {
                self.finish_current()?;
            }
            let take = self.room().min(remaining.len());
            let (chunk, rest) = remaining.split_at(take);
            self.write_chunk(chunk)?;
            remaining = rest;
        }
        Ok(rows.len())
    }

    /// Push buffered rows of the open file to disk without closing it
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.current.as_mut() {
            writer
                .flush()
                .map_err(|e| Error::write(&self.schema.table, e.to_string()))?;
            debug!("Flushed {} ({} rows)", writer.path().display(), writer.rows_written());
        }
        self.rows_since_flush = 0;
        Ok(())
    }

    /// Finalize the open file, returning every file this writer produced
    pub fn close(mut self) -> Result<Vec<WrittenFile>> {
        self.finish_current()?;
        Ok(self.files)
    }

    /// Flush and close, reporting what was written
    pub fn finish(mut self) -> Result<WriterSummary> {
        self.flush()?;
        let table = self.schema.table.clone();
        let rows = self.total_rows;
        let files = self.close()?;
        Ok(WriterSummary { table, rows, files })
    }

    fn current_is_full(&self) -> bool {
        self.policy.is_rotating()
            && self
                .current
                .as_ref()
                .is_some_and(|w| w.rows_written() >= self.policy.max_rows_per_file)
    }

    /// Rows the open (or next) file can still take
    fn room(&self) -> usize {
        if !self.policy.is_rotating() {
            return usize::MAX;
        }
        let used = self.current.as_ref().map_or(0, ParquetWriter::rows_written);
        self.policy.max_rows_per_file.saturating_sub(used)
    }

    fn write_chunk(&mut self, rows: &[FlatRecord]) -> Result<()> {
        let batch = rows_to_batch(&self.schema, self.arrow_schema.clone(), rows)?;
        self.ensure_open()?;
        let Some(writer) = self.current.as_mut() else {
            return Err(Error::write(&self.schema.table, "no open file"));
        };
        writer
            .write(&batch)
            .map_err(|e| Error::write(&self.schema.table, e.to_string()))?;

        self.total_rows += rows.len();
        self.rows_since_flush += rows.len();

        if self.policy.flush_every_rows > 0 && self.rows_since_flush >= self.policy.flush_every_rows {
            self.flush()?;
        }
        Ok(())
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.current.is_none() {
            std::fs::create_dir_all(&self.policy.output_dir).map_err(|e| {
                Error::write(
                    &self.schema.table,
                    format!("Failed to create {}: {e}", self.policy.output_dir.display()),
                )
            })?;

            let name = self.policy.file_name(&self.schema.table, self.next_seq);
            let path = self.policy.output_dir.join(name);
            let writer = ParquetWriter::create(&path, self.arrow_schema.clone(), &self.policy.parquet)
                .map_err(|e| Error::write(&self.schema.table, e.to_string()))?;

            info!("Table {}: opened {}", self.schema.table, path.display());
            self.next_seq += 1;
            self.rows_since_flush = 0;
            self.current = Some(writer);
        }
        Ok(())
    }

    fn finish_current(&mut self) -> Result<()> {
        let Some(writer) = self.current.take() else {
            return Ok(());
        };

        let (path, rows) = writer
            .close()
            .map_err(|e| Error::write(&self.schema.table, e.to_string()))?;
        info!("Table {}: closed {} ({} rows)", self.schema.table, path.display(), rows);
        self.files.push(WrittenFile { path, rows });
        Ok(())
    }
}
