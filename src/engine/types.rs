//! Engine types

use crate::flatten::TraversalStats;
use crate::output::{WriterSummary, WrittenFile};
use serde::Serialize;
use std::collections::BTreeMap;

/// Statistics from one flattening run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Root records found in the document
    pub root_records: usize,
    /// Root records skipped for not being objects
    pub skipped_roots: usize,
    /// Total rows written across all tables
    pub rows_written: usize,
    /// Rows per table, including tables that produced none
    pub rows_per_table: BTreeMap<String, usize>,
    /// Non-object array elements skipped at terminal paths
    pub skipped_elements: usize,
    /// Terminal paths that were not arrays
    pub skipped_terminals: usize,
    /// Finished output files
    pub files: Vec<WrittenFile>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in traversal counters
    pub fn add_traversal(&mut self, traversal: &TraversalStats) {
        self.skipped_elements += traversal.skipped_elements;
        self.skipped_terminals += traversal.skipped_terminals;
    }

    /// Fold in a closed writer's report
    pub fn add_writer(&mut self, summary: WriterSummary) {
        self.rows_written += summary.rows;
        *self.rows_per_table.entry(summary.table).or_default() += summary.rows;
        self.files.extend(summary.files);
    }

    /// Rows written for a table
    pub fn rows_for(&self, table: &str) -> usize {
        self.rows_per_table.get(table).copied().unwrap_or(0)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
