//! Source fetch module
//!
//! Brings the source document onto local disk before parsing.
//!
//! # Overview
//!
//! - `SourceKind` - Local file, HTTP(S) URL, or object store URL
//! - `Fetcher` - Async download of one URI into a local file
//! - `HttpFetcher` - Retries with backoff and honors `Retry-After`
//! - `ObjectStoreFetcher` - `s3://`, `gs://` and `az://` via `object_store`
//! - `LocalFetcher` - Plain copy

mod http;
mod local;
mod store;
mod types;

pub use http::{parse_retry_after, HttpFetcher};
pub use local::{local_path, LocalFetcher};
pub use store::{ObjectLocation, ObjectStoreFetcher};
pub use types::{file_name_for, FetchConfig, SourceKind};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Downloads a source document
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Write the contents of `uri` to `dest`, returning the byte count
    async fn fetch(&self, uri: &str, dest: &Path) -> Result<u64>;
}

/// Fetcher for a source kind
pub fn fetcher_for(kind: SourceKind, config: &FetchConfig) -> Result<Box<dyn Fetcher>> {
    Ok(match kind {
        SourceKind::Local => Box::new(LocalFetcher::new()),
        SourceKind::Http => Box::new(HttpFetcher::new(config.clone())?),
        SourceKind::ObjectStore => Box::new(ObjectStoreFetcher::new()),
    })
}
