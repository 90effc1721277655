//! Output module
//!
//! Turns flattened rows into Parquet files.
//!
//! # Overview
//!
//! - `synthesize` - Builds a table's column layout from configuration
//! - `ParquetWriter` - One open Parquet file
//! - `RotatingWriter` - Lazily opened, sequentially numbered files per table
//! - `ChannelWriter` - A rotating writer on its own thread, fed by a channel
//! - `WriterSet` - Per-table writers behind the traversal's `RowSink`

mod channel;
mod rotating;
mod schema;
mod sink;
mod writer;

pub use channel::{ChannelWriter, WriterCommand};
pub use rotating::{
    render_filename, RotatingWriter, RotationPolicy, WriterSummary, WrittenFile,
    DEFAULT_FILENAME_TEMPLATE,
};
pub use schema::{
    rows_to_batch, synthesize, ColumnDescriptor, TableSchema, META_JSON_PATH, META_PARQUET_TYPE,
    META_REQUIRED, META_SOURCE, META_TABLE,
};
pub use sink::{WriteMode, WriterSet};
pub use writer::{ParquetWriter, ParquetWriterConfig};
