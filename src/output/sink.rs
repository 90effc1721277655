//! Per-table writer set
//!
//! Routes flattened rows to their table's writer, buffering up to
//! `batch_size` rows per table between writes.

use super::channel::ChannelWriter;
use super::rotating::{RotatingWriter, RotationPolicy, WriterSummary};
use super::schema::synthesize;
use crate::error::{Error, Result};
use crate::flatten::{FlatRecord, RowSink};
use crate::loader::{ParseConfig, TableConfig};
use std::collections::BTreeMap;
use std::mem;
use tracing::{error, info};

/// How writers are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Writes happen on the traversal thread
    Direct,
    /// One writer thread per table, fed through a channel of this capacity
    Pipelined { capacity: usize },
}

enum TableWriter {
    Direct(RotatingWriter),
    Channel(ChannelWriter),
}

impl TableWriter {
    fn write(&mut self, rows: Vec<FlatRecord>) -> Result<()> {
        match self {
            TableWriter::Direct(writer) => writer.write(&rows).map(|_| ()),
            TableWriter::Channel(writer) => writer.send(rows),
        }
    }

    fn finish(self) -> Result<WriterSummary> {
        match self {
            TableWriter::Direct(writer) => writer.finish(),
            TableWriter::Channel(writer) => writer.finish(),
        }
    }
}

struct TableSlot {
    writer: TableWriter,
    buffer: Vec<FlatRecord>,
}

/// One writer per declared table
pub struct WriterSet {
    slots: BTreeMap<String, TableSlot>,
    batch_size: usize,
}

impl WriterSet {
    /// Build writers for every table in `config`
    pub fn from_config(config: &ParseConfig) -> Result<Self> {
        let mode = if config.writer.pipelined {
            WriteMode::Pipelined {
                capacity: config.writer.channel_capacity,
            }
        } else {
            WriteMode::Direct
        };
        Self::new(
            &config.tables,
            &RotationPolicy::from_config(config),
            config.writer.batch_size,
            mode,
        )
    }

    /// Build writers for `tables` sharing one rotation policy
    pub fn new(
        tables: &[TableConfig],
        policy: &RotationPolicy,
        batch_size: usize,
        mode: WriteMode,
    ) -> Result<Self> {
        let mut set = Self {
            slots: BTreeMap::new(),
            batch_size: batch_size.max(1),
        };

        for table in tables {
            let writer = RotatingWriter::new(synthesize(table), policy.clone());
            let writer = match mode {
                WriteMode::Direct => TableWriter::Direct(writer),
                WriteMode::Pipelined { capacity } => match ChannelWriter::spawn(writer, capacity) {
                    Ok(writer) => TableWriter::Channel(writer),
                    Err(e) => {
                        set.abort();
                        return Err(e);
                    }
                },
            };
            set.slots.insert(
                table.name.clone(),
                TableSlot {
                    writer,
                    buffer: Vec::with_capacity(set.batch_size),
                },
            );
        }

        Ok(set)
    }

    /// Number of table writers
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Hand every buffered row to its writer
    ///
    /// Every table is attempted; the first error is returned.
    pub fn flush_buffers(&mut self) -> Result<()> {
        let mut first_error = None;
        for (table, slot) in &mut self.slots {
            if slot.buffer.is_empty() {
                continue;
            }
            let rows = mem::take(&mut slot.buffer);
            if let Err(e) = slot.writer.write(rows) {
                error!("Table {table}: failed to write buffered rows: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush buffers and close every writer
    ///
    /// All writers are closed even when one fails; the first error is returned.
    pub fn close_all(mut self) -> Result<Vec<WriterSummary>> {
        let mut first_error = self.flush_buffers().err();
        let mut summaries = Vec::with_capacity(self.slots.len());

        for (table, slot) in mem::take(&mut self.slots) {
            match slot.writer.finish() {
                Ok(summary) => {
                    info!(
                        "Table {}: {} rows in {} file(s)",
                        summary.table,
                        summary.rows,
                        summary.files.len()
                    );
                    summaries.push(summary);
                }
                Err(e) => {
                    error!("Table {table}: failed to close writer: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }

    /// Best-effort close after a fatal error; failures are only logged
    pub fn abort(&mut self) {
        for (table, slot) in mem::take(&mut self.slots) {
            if let Err(e) = slot.writer.finish() {
                error!("Table {table}: cleanup failed: {e}");
            }
        }
    }
}

impl RowSink for WriterSet {
    fn write_row(&mut self, table: &str, row: FlatRecord) -> Result<()> {
        let batch_size = self.batch_size;
        let slot = self
            .slots
            .get_mut(table)
            .ok_or_else(|| Error::write(table, "no writer configured"))?;

        slot.buffer.push(row);
        if slot.buffer.len() >= batch_size {
            let rows = mem::replace(&mut slot.buffer, Vec::with_capacity(batch_size));
            slot.writer.write(rows)?;
        }
        Ok(())
    }
}
