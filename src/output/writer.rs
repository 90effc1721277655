//! Parquet file writer
//!
//! One open Parquet file per writer. Rows are encoded to RecordBatches by the
//! caller; this layer only owns the file handle and writer properties.

use crate::error::{Error, Result};
use crate::types::CompressionCodec;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    codec: CompressionCodec,
    row_group_size: usize,
}

impl ParquetWriterConfig {
    /// Get compression codec
    #[must_use]
    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    /// Get row group size
    #[must_use]
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::None,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set row group size (zero keeps the current value)
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.row_group_size = size;
        }
        self
    }

    /// Build writer properties
    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.codec.into())
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Parquet file writer
pub struct ParquetWriter {
    /// Arrow writer
    writer: ArrowWriter<File>,
    /// Destination file
    path: PathBuf,
    /// Number of rows written
    rows_written: usize,
}

impl ParquetWriter {
    /// Create the file at `path` and open a Parquet writer on it
    pub fn create(
        path: impl AsRef<Path>,
        schema: SchemaRef,
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::Output {
            message: format!("Failed to create file {}: {e}", path.display()),
        })?;

        let props = config.build_properties();
        let writer = ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| Error::Output {
            message: format!("Failed to create Parquet writer for {}: {e}", path.display()),
        })?;

        Ok(Self {
            writer,
            path,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch to the file
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch to {}: {e}", self.path.display()),
        })?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Close the in-progress row group so buffered rows reach the file
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::Output {
            message: format!("Failed to flush {}: {e}", self.path.display()),
        })
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Destination path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the writer and finalize the file, returning its path and row count
    pub fn close(self) -> Result<(PathBuf, usize)> {
        let rows = self.rows_written;
        self.writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer for {}: {e}", self.path.display()),
        })?;
        Ok((self.path, rows))
    }
}
