//! Remote image fetching for process requests that carry a URL instead of
//! inline bytes.
//!
//! Every fetch is bounded by a timeout (10 seconds by default). When it
//! elapses the in-flight request is dropped and a [`FetchError::Timeout`] is
//! returned. There are no retries. Bodies larger than the caller's limit are
//! abandoned as soon as the limit is crossed.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;

/// Default timeout for remote image fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Image bytes fetched from a remote reference.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Bytes,

    /// `Content-Type` reported by the remote, if any
    pub content_type: Option<String>,
}

/// HTTP fetcher for remote image references.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageFetcher {
    /// Create a fetcher with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        // Builder only fails on TLS backend initialization.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the image at `reference`, reading at most `max_bytes` of body.
    ///
    /// Relative references (e.g. `/uploads/original-....png`) are resolved
    /// against `origin`, the scheme and host the request arrived on.
    pub async fn fetch(
        &self,
        reference: &str,
        origin: Option<&str>,
        max_bytes: u64,
    ) -> Result<FetchedImage, FetchError> {
        let url = resolve_reference(reference, origin)?;
        debug!(url = %url, "Fetching remote image");

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                FetchError::Request(e.to_string())
            }
        };

        // The client-level timeout covers connect, headers and body.
        let mut response = tokio::time::timeout(self.timeout, self.client.get(url.clone()).send())
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Remote image fetch failed");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_string());

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: max_bytes,
        };

        if response.content_length().is_some_and(|len| len > max_bytes) {
            warn!(url = %url, limit = max_bytes, "Remote image declares oversized body");
            return Err(too_large());
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(map_err)? {
            if buf.len() as u64 + chunk.len() as u64 > max_bytes {
                warn!(url = %url, limit = max_bytes, "Remote image body exceeds limit");
                return Err(too_large());
            }
            buf.extend_from_slice(&chunk);
        }
        let data = buf.freeze();
        debug!(url = %url, size = data.len(), "Fetched remote image");

        Ok(FetchedImage { data, content_type })
    }
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

/// Turn a possibly relative reference into an absolute http(s) URL.
pub fn resolve_reference(reference: &str, origin: Option<&str>) -> Result<Url, FetchError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(FetchError::InvalidUrl("empty reference".to_string()));
    }

    let url = if reference.starts_with("http://") || reference.starts_with("https://") {
        Url::parse(reference)
    } else {
        let origin = origin.ok_or_else(|| {
            FetchError::InvalidUrl(format!("relative reference without origin: {}", reference))
        })?;
        Url::parse(origin).and_then(|base| base.join(reference))
    }
    .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", reference, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "unsupported scheme: {}",
            other
        ))),
    }
}
