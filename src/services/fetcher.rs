//! HTTP fetching for playlists and guides
//!
//! The parsers never touch the network; they receive whatever this layer
//! downloaded. Retry, timeout and size limits live here.

use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{IngestError, Result};

/// Source of raw payloads for the ingestion pipelines
pub trait Fetcher: Send + Sync {
    /// Download the full body of `url`
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// reqwest-backed fetcher with retry and payload limits
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(
        user_agent: &str,
        timeout_ms: u64,
        max_retries: u32,
        max_size_mb: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_retries,
            max_bytes: (max_size_mb as u64) * 1024 * 1024,
        })
    }

    fn backoff(attempt: u32) -> Duration {
        Duration::from_millis((1u64 << attempt).saturating_mul(500).min(10_000))
    }

    async fn send_with_retry(&self, url: &str) -> Result<Response> {
        let mut attempt = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        if let Some(len) = resp.content_length() {
                            self.check_size(url, len)?;
                        }
                        return Ok(resp);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let backoff = Self::backoff(attempt);
                        let backoff_ms = backoff.as_millis() as u64;
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "429", "backoff_ms" = backoff_ms);
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    let reason = status
                        .canonical_reason()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Erro".to_string());

                    return Err(IngestError::Fetch {
                        url: url.to_string(),
                        reason: format!("HTTP {}: {}", status.as_u16(), reason),
                        status: Some(status.as_u16()),
                    });
                }
                Err(err) => {
                    if attempt < self.max_retries {
                        let backoff = Self::backoff(attempt);
                        let backoff_ms = backoff.as_millis() as u64;
                        tracing::warn!("fetch_retry" = attempt + 1, "reason" = "network", "backoff_ms" = backoff_ms);
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(IngestError::fetch(url, err.to_string()));
                }
            }
        }
    }

    fn check_size(&self, url: &str, len: u64) -> Result<()> {
        if len > self.max_bytes {
            return Err(IngestError::fetch(
                url,
                format!(
                    "payload too large: {:.1}MB (limit {}MB)",
                    len as f64 / 1024.0 / 1024.0,
                    self.max_bytes / 1024 / 1024
                ),
            ));
        }
        Ok(())
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send_with_retry(url).await?;

        if let Some(len) = response.content_length() {
            tracing::info!("Downloading {:.2} MB from {}", len as f64 / 1024.0 / 1024.0, url);
        }

        // Servers often omit Content-Length, so the limit is enforced while streaming too
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| IngestError::fetch(url, e.to_string()))?;
            self.check_size(url, (body.len() + chunk.len()) as u64)?;
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}
