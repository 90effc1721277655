//! Channel-fed writer
//!
//! Runs a [`RotatingWriter`] on a dedicated thread that drains a bounded
//! channel one batch at a time. The producer sends batches and then `Done`;
//! the thread flushes, closes the file, and reports back over a oneshot.
//! Must be driven from blocking code (a plain thread or `spawn_blocking`),
//! never from inside an async task.

use super::rotating::{RotatingWriter, WriterSummary};
use crate::error::{Error, Result};
use crate::flatten::FlatRecord;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// Messages accepted by a writer thread
#[derive(Debug)]
pub enum WriterCommand {
    Batch(Vec<FlatRecord>),
    Done,
}

/// Handle to a writer thread
pub struct ChannelWriter {
    table: String,
    sender: Option<mpsc::Sender<WriterCommand>>,
    result: oneshot::Receiver<Result<WriterSummary>>,
    handle: Option<JoinHandle<()>>,
}

impl ChannelWriter {
    /// Move `writer` onto its own thread behind a channel of `capacity` batches
    pub fn spawn(writer: RotatingWriter, capacity: usize) -> Result<Self> {
        let table = writer.table().to_string();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (result_tx, result) = oneshot::channel();

        let handle = std::thread::Builder::new()
            .name(format!("writer-{table}"))
            .spawn(move || {
                let outcome = drain(writer, receiver);
                // Receiver gone means the owner already gave up on this table.
                let _ = result_tx.send(outcome);
            })
            .map_err(|e| Error::write(&table, format!("Failed to spawn writer thread: {e}")))?;

        Ok(Self {
            table,
            sender: Some(sender),
            result,
            handle: Some(handle),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Queue a batch, blocking while the channel is full
    pub fn send(&self, rows: Vec<FlatRecord>) -> Result<()> {
        let Some(sender) = &self.sender else {
            return Err(Error::write(&self.table, "writer already finished"));
        };
        sender
            .blocking_send(WriterCommand::Batch(rows))
            .map_err(|_| Error::write(&self.table, "writer thread stopped"))
    }

    /// Signal completion and wait for the thread to close its file
    pub fn finish(mut self) -> Result<WriterSummary> {
        if let Some(sender) = self.sender.take() {
            // A closed channel means the thread already exited with an error,
            // which arrives through the result channel below.
            let _ = sender.blocking_send(WriterCommand::Done);
        }

        let outcome = self
            .result
            .blocking_recv()
            .map_err(|_| Error::write(&self.table, "writer thread exited without reporting"));

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(Error::write(&self.table, "writer thread panicked"));
            }
        }

        outcome?
    }
}

fn drain(mut writer: RotatingWriter, mut receiver: mpsc::Receiver<WriterCommand>) -> Result<WriterSummary> {
    while let Some(command) = receiver.blocking_recv() {
        match command {
            WriterCommand::Batch(rows) => {
                if let Err(e) = writer.write(&rows) {
                    receiver.close();
                    let table = writer.table().to_string();
                    if let Err(close_err) = writer.close() {
                        error!("Table {table}: failed to close after write error: {close_err}");
                    }
                    return Err(e);
                }
            }
            WriterCommand::Done => break,
        }
    }

    debug!("Writer thread for {} draining complete", writer.table());
    writer.finish()
}
