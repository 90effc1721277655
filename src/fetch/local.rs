//! Local file fetcher

use super::Fetcher;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Copies a local file (plain path or `file://` URL) into place
#[derive(Debug, Clone, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }
}

/// Filesystem path for a local source
pub fn local_path(uri: &str) -> PathBuf {
    Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(uri))
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(&self, uri: &str, dest: &Path) -> Result<u64> {
        let source = local_path(uri);
        info!("Copying {} to {}", source.display(), dest.display());

        tokio::fs::copy(&source, dest).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: source.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })
    }
}
