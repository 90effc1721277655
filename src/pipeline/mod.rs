//! Pipeline module
//!
//! Runs a source through Download, Parse and Clean steps in order, timing
//! each one. Steps share a [`PipelineContext`] that owns the temporary
//! working directory; the directory is removed by the clean step or, if a
//! step fails first, when the context is dropped.

mod steps;

pub use steps::{CleanStep, DownloadStep, ParseStep};

use crate::engine::RunStats;
use crate::error::{Error, Result};
use crate::loader::ParseConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

/// A unit of work in a pipeline
#[async_trait]
pub trait Step: Send {
    /// Name used in progress logs
    fn name(&self) -> &str;

    /// Run the step
    async fn run(&mut self, ctx: &mut PipelineContext) -> Result<()>;
}

/// State shared between steps
pub struct PipelineContext {
    pub config: Arc<ParseConfig>,
    work_dir: Option<TempDir>,
    /// Local copy of the source, set by the download step
    pub local_input: Option<PathBuf>,
    /// Result of the parse step
    pub stats: Option<RunStats>,
}

impl PipelineContext {
    /// Create a context with a fresh temporary working directory
    pub fn new(config: ParseConfig) -> Result<Self> {
        let work_dir = tempfile::Builder::new().prefix("json2parquet").tempdir()?;
        Ok(Self {
            config: Arc::new(config),
            work_dir: Some(work_dir),
            local_input: None,
            stats: None,
        })
    }

    /// Temporary working directory
    pub fn work_dir(&self) -> Result<&Path> {
        self.work_dir
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| Error::Other("Working directory already removed".to_string()))
    }
}

/// Sequence of steps
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Create a pipeline from steps
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Download, parse, clean
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(DownloadStep),
            Box::new(ParseStep),
            Box::new(CleanStep),
        ])
    }

    /// Step names in order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, stopping at the first failure
    pub async fn run(&mut self, ctx: &mut PipelineContext) -> Result<()> {
        let total = self.steps.len();
        for (i, step) in self.steps.iter_mut().enumerate() {
            let name = step.name().to_string();
            info!("[Pipeline] Step {}/{total}: {name} - starting", i + 1);

            let started = Instant::now();
            step.run(ctx).await?;

            info!(
                "[Pipeline] Step {}/{total}: {name} - done in {:.3}s",
                i + 1,
                started.elapsed().as_secs_f64()
            );
        }
        Ok(())
    }
}

/// Run the standard pipeline for a configuration
pub async fn run_pipeline(config: ParseConfig) -> Result<RunStats> {
    let mut ctx = PipelineContext::new(config)?;
    Pipeline::standard().run(&mut ctx).await?;
    ctx.stats
        .ok_or_else(|| Error::Other("Pipeline finished without parse results".to_string()))
}
