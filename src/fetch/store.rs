//! Object store fetcher (S3, GCS, Azure)
//!
//! Credentials and endpoints come from the environment through the
//! `object_store` builders' `from_env`.

use super::Fetcher;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A parsed `scheme://bucket/key` location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub scheme: String,
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Parse `s3://`, `gs://` or `az://` URLs
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| Error::config(format!("Invalid object store URL: {uri}")))?;

        if !matches!(scheme, "s3" | "gs" | "az") {
            return Err(Error::config(format!(
                "Unsupported object store scheme '{scheme}' in {uri}"
            )));
        }

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() || key.is_empty() {
            return Err(Error::config(format!(
                "Object store URL must name a bucket and key: {uri}"
            )));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Build the store for this location's bucket
    fn build_store(&self) -> Result<Arc<dyn ObjectStore>> {
        let store: Arc<dyn ObjectStore> = match self.scheme.as_str() {
            "s3" => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(&self.bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?,
            ),
            "gs" => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&self.bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            _ => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(&self.bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
        };
        Ok(store)
    }
}

/// Fetcher for object store sources
#[derive(Debug, Clone, Default)]
pub struct ObjectStoreFetcher;

impl ObjectStoreFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Fetcher for ObjectStoreFetcher {
    async fn fetch(&self, uri: &str, dest: &Path) -> Result<u64> {
        let location = ObjectLocation::parse(uri)?;
        let store = location.build_store()?;
        info!("Downloading {uri}");

        let result = store.get(&ObjectPath::from(location.key.as_str())).await?;
        let mut stream = result.into_stream();

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {written} bytes to {}", dest.display());
        Ok(written)
    }
}
