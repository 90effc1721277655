//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::engine::{FlattenEngine, RunStats};
use crate::error::{Error, Result};
use crate::loader::{load_config, ParseConfig};
use crate::output::{synthesize, TableSchema};
use crate::pipeline::run_pipeline;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { input, output } => {
                self.run_pipeline(input.as_deref(), output.as_deref()).await
            }
            Commands::Parse { input, output } => {
                self.parse(input.as_deref(), output.as_deref()).await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Full download, parse, clean pipeline
    async fn run_pipeline(&self, input: Option<&str>, output: Option<&Path>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(input) = input {
            config = config.with_source_path(input);
        }
        if let Some(output) = output {
            config = config.with_output_path(output);
        }

        info!("Running pipeline for {}", config.source.path);
        let stats = run_pipeline(config).await?;
        self.report(&stats);
        Ok(())
    }

    /// Parse a local file directly
    async fn parse(&self, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(output) = output {
            config = config.with_output_path(output);
        }

        let input = match input {
            Some(path) => path.to_path_buf(),
            None if !config.source.path.is_empty() => PathBuf::from(&config.source.path),
            None => return Err(Error::missing_field("source.path")),
        };

        let engine = FlattenEngine::new(config);
        let stats = tokio::task::spawn_blocking(move || engine.parse_file(&input))
            .await
            .map_err(|e| Error::Other(format!("Parse task failed: {e}")))??;

        self.report(&stats);
        Ok(())
    }

    /// Load the config and print the synthesized schemas
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        let schemas: Vec<TableSchema> = config.tables.iter().map(synthesize).collect();

        self.output_message(&json!({
            "valid": true,
            "config": self.cli.config.display().to_string(),
            "tables": schemas,
        }));
        Ok(())
    }

    fn load_config(&self) -> Result<ParseConfig> {
        load_config(&self.cli.config)
    }

    fn report(&self, stats: &RunStats) {
        self.output_message(&json!({ "stats": stats }));
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
