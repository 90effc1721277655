//! Pipeline steps

use super::{PipelineContext, Step};
use crate::engine::FlattenEngine;
use crate::error::{Error, Result};
use crate::fetch::{fetcher_for, file_name_for, FetchConfig, SourceKind};
use async_trait::async_trait;
use tracing::{info, warn};

/// Fetches or copies the source into `<work_dir>/src/`
#[derive(Debug, Default)]
pub struct DownloadStep;

#[async_trait]
impl Step for DownloadStep {
    fn name(&self) -> &str {
        "Downloader"
    }

    async fn run(&mut self, ctx: &mut PipelineContext) -> Result<()> {
        let source = &ctx.config.source;
        if source.path.is_empty() {
            return Err(Error::missing_field("source.path"));
        }

        let dest_dir = ctx.work_dir()?.join("src");
        tokio::fs::create_dir_all(&dest_dir).await?;
        let dest = dest_dir.join(file_name_for(&source.path));

        let kind = SourceKind::detect(&source.source_type, &source.path);
        info!("[Downloader] Resolving {kind} source: {} -> {}", source.path, dest.display());

        let fetcher = fetcher_for(kind, &FetchConfig::from(&ctx.config.fetch))?;
        let bytes = fetcher.fetch(&source.path, &dest).await?;
        info!("[Downloader] Saved {bytes} bytes to {}", dest.display());

        ctx.local_input = Some(dest);
        Ok(())
    }
}

/// Runs the flattening engine over the downloaded file
#[derive(Debug, Default)]
pub struct ParseStep;

#[async_trait]
impl Step for ParseStep {
    fn name(&self) -> &str {
        "Parse"
    }

    async fn run(&mut self, ctx: &mut PipelineContext) -> Result<()> {
        let input = ctx
            .local_input
            .clone()
            .ok_or_else(|| Error::config("No local input to parse; download step did not run"))?;
        info!("[Parse] Parsing JSON from {}", input.display());

        // Traversal is CPU-bound and writers may block on channels.
        let engine = FlattenEngine::new(ctx.config.as_ref().clone());
        let stats = tokio::task::spawn_blocking(move || engine.parse_file(&input))
            .await
            .map_err(|e| Error::Other(format!("Parse task failed: {e}")))??;

        ctx.stats = Some(stats);
        Ok(())
    }
}

/// Removes the working directory
#[derive(Debug, Default)]
pub struct CleanStep;

#[async_trait]
impl Step for CleanStep {
    fn name(&self) -> &str {
        "Clean"
    }

    async fn run(&mut self, ctx: &mut PipelineContext) -> Result<()> {
        let Some(work_dir) = ctx.work_dir.take() else {
            return Ok(());
        };

        let path = work_dir.path().to_path_buf();
        match work_dir.close() {
            Ok(()) => info!("[Clean] Removed {}", path.display()),
            Err(e) => warn!("[Clean] Failed to remove {}: {e}", path.display()),
        }
        Ok(())
    }
}
