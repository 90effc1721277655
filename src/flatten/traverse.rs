//! Table path traversal
//!
//! Walks a table's `json_path` through the document. Arrays met before the
//! last segment are iterated transparently; the value at the last segment
//! must be an array of objects, each of which becomes one row. Every row's
//! object is then bound as an ancestor and searched for further tables.

use super::context::TraversalContext;
use super::record::{flatten_record, FlatRecord};
use crate::error::Result;
use crate::loader::TableConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Destination for flattened rows
pub trait RowSink {
    /// Accept one row for `table`
    fn write_row(&mut self, table: &str, row: FlatRecord) -> Result<()>;
}

/// Counters collected while traversing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Rows handed to the sink
    pub rows_emitted: usize,
    /// Rows per table
    pub rows_per_table: BTreeMap<String, usize>,
    /// Non-object array elements skipped at a terminal path
    pub skipped_elements: usize,
    /// Terminal paths that resolved to something other than an array
    pub skipped_terminals: usize,
}

/// Drives table traversal for root records
pub struct Traverser<'t, S: RowSink + ?Sized> {
    tables: &'t [TableConfig],
    sink: &'t mut S,
    stats: TraversalStats,
}

impl<'t, S: RowSink + ?Sized> Traverser<'t, S> {
    /// Create a traverser over `tables` writing into `sink`
    pub fn new(tables: &'t [TableConfig], sink: &'t mut S) -> Self {
        Self {
            tables,
            sink,
            stats: TraversalStats::default(),
        }
    }

    /// Counters so far
    pub fn stats(&self) -> &TraversalStats {
        &self.stats
    }

    /// Consume the traverser, returning its counters
    pub fn into_stats(self) -> TraversalStats {
        self.stats
    }

    /// Process one root record with an empty context
    pub fn process_root(&mut self, record: &Value) -> Result<()> {
        let ctx = TraversalContext::new();
        self.process_record(record, &ctx, true)
    }

    /// Run every table against `record`
    ///
    /// Root-level tables only fire for root records, once each.
    fn process_record<'a>(
        &mut self,
        record: &'a Value,
        ctx: &TraversalContext<'a>,
        at_root: bool,
    ) -> Result<()> {
        let tables = self.tables;
        for table in tables {
            if table.is_root() {
                if at_root {
                    let ctx = ctx.with_current(record);
                    self.emit(table, record, &ctx)?;
                }
            } else {
                let ctx = ctx.with_current(record);
                let segments = table.path_segments();
                self.walk(table, &segments, record, 0, &ctx)?;
            }
        }
        Ok(())
    }

    fn walk<'a>(
        &mut self,
        table: &TableConfig,
        segments: &[&str],
        data: &'a Value,
        idx: usize,
        ctx: &TraversalContext<'a>,
    ) -> Result<()> {
        if idx >= segments.len() {
            return self.emit_terminal(table, data, ctx);
        }

        match data {
            Value::Array(items) => {
                // The array was reached through the previous segment, so its
                // object elements are bound under that segment's name.
                let binding = idx
                    .checked_sub(1)
                    .map(|i| segments[i])
                    .filter(|name| !name.is_empty());

                for item in items {
                    match (item, binding) {
                        (Value::Object(_), Some(name)) => {
                            let item_ctx = ctx.with_entity(name, item);
                            self.walk(table, segments, item, idx, &item_ctx)?;
                        }
                        _ => self.walk(table, segments, item, idx, ctx)?,
                    }
                }
                Ok(())
            }
            Value::Object(map) => {
                let segment = segments[idx];
                if segment.is_empty() {
                    return self.walk(table, segments, data, idx + 1, ctx);
                }
                match map.get(segment) {
                    Some(next) if !next.is_null() => {
                        self.walk(table, segments, next, idx + 1, ctx)
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    fn emit_terminal<'a>(
        &mut self,
        table: &TableConfig,
        data: &'a Value,
        ctx: &TraversalContext<'a>,
    ) -> Result<()> {
        let Value::Array(items) = data else {
            warn!(
                "Table {}: expected array at path {}, found {}",
                table.name,
                table.json_path,
                json_type_name(data)
            );
            self.stats.skipped_terminals += 1;
            return Ok(());
        };

        for item in items {
            if !item.is_object() {
                warn!(
                    "Table {}: skipping non-object item at path {}",
                    table.name, table.json_path
                );
                self.stats.skipped_elements += 1;
                continue;
            }

            self.emit(table, item, ctx)?;

            let child_ctx = ctx.with_entity(&table.name, item);
            self.process_record(item, &child_ctx, false)?;
        }
        Ok(())
    }

    fn emit(&mut self, table: &TableConfig, record: &Value, ctx: &TraversalContext<'_>) -> Result<()> {
        let row = flatten_record(table, record, ctx);
        self.sink.write_row(&table.name, row)?;

        self.stats.rows_emitted += 1;
        *self
            .stats
            .rows_per_table
            .entry(table.name.clone())
            .or_default() += 1;

        if self.stats.rows_emitted % 100_000 == 0 {
            debug!("Flattened {} rows", self.stats.rows_emitted);
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
