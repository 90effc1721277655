//! CLI module
//!
//! Command-line interface for flattening JSON documents.
//!
//! # Commands
//!
//! - `run` - Download the source, flatten it, clean up (alias `generic`)
//! - `parse` - Flatten a local file
//! - `validate` - Check the configuration and print table schemas

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
