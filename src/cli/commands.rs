//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flatten nested JSON into Parquet tables
#[derive(Parser, Debug)]
#[command(name = "json2parquet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Parse configuration file (YAML)
    #[arg(short, long, global = true, default_value = "parse_config.yaml")]
    pub config: PathBuf,

    /// Output format for reports
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the source, flatten it, and clean up
    #[command(alias = "generic")]
    Run {
        /// Source override (local path or URL)
        #[arg(short, long)]
        input: Option<String>,

        /// Output directory override
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flatten a local JSON file without downloading
    Parse {
        /// Local JSON file (defaults to source.path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory override
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and print table schemas
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single-line JSON
    Json,
    /// Indented JSON
    Pretty,
}
