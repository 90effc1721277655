//! Fetch types

use crate::loader::FetchDefinition;
use crate::types::BackoffType;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Where a source document lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A path on the local filesystem (or a `file://` URL)
    Local,
    /// An `http://` or `https://` URL
    Http,
    /// An `s3://`, `gs://` or `az://` URL
    ObjectStore,
}

impl SourceKind {
    /// Detect the kind from an explicit `source.type`, falling back to the URL scheme
    pub fn detect(source_type: &str, path: &str) -> Self {
        match source_type.trim().to_ascii_lowercase().as_str() {
            "http" | "https" | "url" => return SourceKind::Http,
            "s3" | "gs" | "gcs" | "az" | "azure" => return SourceKind::ObjectStore,
            "file" | "local" => return SourceKind::Local,
            _ => {}
        }

        match Url::parse(path) {
            Ok(url) => match url.scheme() {
                "http" | "https" => SourceKind::Http,
                "s3" | "gs" | "az" => SourceKind::ObjectStore,
                _ => SourceKind::Local,
            },
            Err(_) => SourceKind::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Http => "http",
            SourceKind::ObjectStore => "object_store",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File name a downloaded source is stored under
///
/// Uses the last path segment of the URI without any query string.
pub fn file_name_for(uri: &str) -> String {
    const FALLBACK: &str = "source.json";

    let name = match Url::parse(uri) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => {
            let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
            Path::new(without_query)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        }
    };

    name.filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK.to_string())
}

/// Retry and timeout settings for remote fetches
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff and Retry-After waits
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&FetchDefinition::default())
    }
}

impl From<&FetchDefinition> for FetchConfig {
    fn from(def: &FetchDefinition) -> Self {
        Self {
            timeout: Duration::from_secs(def.timeout_secs),
            max_retries: def.max_retries,
            initial_backoff: Duration::from_millis(def.initial_backoff_ms),
            max_backoff: Duration::from_secs(def.max_backoff_secs),
            backoff_type: def.backoff,
            user_agent: format!("json2parquet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}
