//! HTTP(S) fetcher with retry
//!
//! Retries transport failures and retryable statuses (429, 5xx) with
//! backoff. A `Retry-After` header, in seconds or HTTP-date form, replaces
//! the computed backoff for that attempt. The body is streamed to disk.

use super::types::FetchConfig;
use super::Fetcher;
use crate::error::{is_retryable_status, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Fetcher for `http://` and `https://` sources
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher with the given retry settings
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the retry settings
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url`, retrying until a success status or a non-retryable failure
    pub async fn get(&self, url: &str) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if !is_retryable_status(status.as_u16()) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    if attempt >= max_retries {
                        warn!("Giving up on {url} after {} attempt(s), last status {status}", attempt + 1);
                        return Err(exhausted(status, &response, max_retries));
                    }

                    let delay = retry_after(&response)
                        .map(|wait| wait.min(self.config.max_backoff))
                        .unwrap_or_else(|| self.config.calculate_backoff(attempt));
                    warn!(
                        "Request failed with {}, attempt {}/{}, retrying in {:?}",
                        status.as_u16(),
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect() || e.is_request();
                    if !transient || attempt >= max_retries {
                        if e.is_timeout() {
                            return Err(Error::Timeout {
                                timeout_ms: self.config.timeout.as_millis() as u64,
                            });
                        }
                        return Err(Error::Http(e));
                    }

                    let delay = self.config.calculate_backoff(attempt);
                    warn!(
                        "Request error ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, uri: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {uri}");
        let mut response = self.get(uri).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {written} bytes to {}", dest.display());
        Ok(written)
    }
}

fn exhausted(status: StatusCode, response: &Response, max_retries: u32) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_seconds = retry_after(response).map_or(0, |d| d.as_secs());
        return Error::RateLimited {
            retry_after_seconds,
        };
    }
    Error::MaxRetriesExceeded { max_retries }
}

fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}

/// Parse a `Retry-After` value relative to `now`
///
/// Accepts delay-seconds or an HTTP-date. Dates in the past yield zero;
/// negative or malformed values yield `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
