//! Flattening engine module
//!
//! Drives traversal over every root record of a document and owns the
//! per-table writers for the duration of a run.
//!
//! # Overview
//!
//! The engine module provides:
//! - `FlattenEngine` - Parses a JSON file or value into Parquet tables
//! - `root_records` - Splits a document into independent root records
//! - `RunStats` - Counters reported after a run

mod types;

pub use types::RunStats;

use crate::error::{Error, Result};
use crate::flatten::{TraversalStats, Traverser};
use crate::loader::ParseConfig;
use crate::output::WriterSet;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Flattening orchestrator
pub struct FlattenEngine {
    config: ParseConfig,
}

impl FlattenEngine {
    /// Create an engine for a validated configuration
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Read and flatten a JSON file
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<RunStats> {
        let path = path.as_ref();
        let started = Instant::now();

        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let doc: Value = serde_json::from_slice(&bytes)?;
        drop(bytes);
        debug!("Decoded {} in {:?}", path.display(), started.elapsed());

        let mut stats = self.parse_value(&doc)?;
        stats.set_duration(started.elapsed().as_millis() as u64);
        Ok(stats)
    }

    /// Flatten an already decoded document
    ///
    /// Writers are closed on every exit path. On a traversal error they are
    /// closed best-effort and the original error is returned.
    pub fn parse_value(&self, doc: &Value) -> Result<RunStats> {
        let started = Instant::now();
        let roots = root_records(doc, self.config.source.root_array())?;
        info!(
            "Flattening {} root record(s) into {} table(s)",
            roots.len(),
            self.config.tables.len()
        );

        let mut writers = WriterSet::from_config(&self.config)?;
        let (traversal, skipped_roots) = match self.traverse(roots, &mut writers) {
            Ok(outcome) => outcome,
            Err(e) => {
                writers.abort();
                return Err(e);
            }
        };
        let summaries = writers.close_all()?;

        let mut stats = RunStats::new();
        stats.root_records = roots.len();
        stats.skipped_roots = skipped_roots;
        stats.add_traversal(&traversal);
        for summary in summaries {
            stats.add_writer(summary);
        }
        stats.set_duration(started.elapsed().as_millis() as u64);

        info!(
            "Wrote {} rows to {} file(s) in {}ms",
            stats.rows_written,
            stats.files.len(),
            stats.duration_ms
        );
        Ok(stats)
    }

    fn traverse(&self, roots: &[Value], writers: &mut WriterSet) -> Result<(TraversalStats, usize)> {
        let mut traverser = Traverser::new(&self.config.tables, writers);
        let mut skipped = 0;

        for (index, record) in roots.iter().enumerate() {
            if !record.is_object() {
                warn!("Skipping non-object root record at index {index}");
                skipped += 1;
                continue;
            }
            traverser.process_root(record)?;
        }

        Ok((traverser.into_stats(), skipped))
    }
}

/// Root records of a document
///
/// An array root is used as-is. An object root is either the array under
/// `root_array` or, without one, a single record. Anything else is a
/// configuration error.
pub fn root_records<'a>(doc: &'a Value, root_array: Option<&str>) -> Result<&'a [Value]> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(map) => match root_array {
            Some(field) => match map.get(field) {
                Some(Value::Array(items)) => Ok(items),
                Some(_) => Err(Error::config(format!("root_array '{field}' is not an array"))),
                None => Err(Error::config(format!(
                    "root_array '{field}' not found in document"
                ))),
            },
            None => Ok(std::slice::from_ref(doc)),
        },
        other => Err(Error::config(format!(
            "Document root must be an object or array, found {}",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "bool",
                Value::Number(_) => "number",
                _ => "string",
            }
        ))),
    }
}

#[cfg(test)]
mod tests;
