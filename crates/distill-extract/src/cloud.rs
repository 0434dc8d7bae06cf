//! Cloud conversion API client, used only as extraction fallback.

use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{Extract, Extraction};
use async_trait::async_trait;
use distill_config::ExtractionConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Client for a hosted document-conversion API.
///
/// Handles scanned input the local extractor cannot; higher cost, so the
/// router calls it only when the local path fails the quality gate.
#[derive(Clone)]
pub struct CloudExtractor {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl CloudExtractor {
    /// Create a client from configuration. Returns `None` when no cloud
    /// endpoint is configured.
    pub fn from_config(config: &ExtractionConfig) -> ExtractResult<Option<Self>> {
        let Some(api_base) = config.cloud_api_base.as_deref() else {
            return Ok(None);
        };

        let api_key = std::env::var(&config.cloud_api_key_env).ok();
        Ok(Some(Self::new(api_base, api_key, config.timeout_seconds)?))
    }

    /// Create a client for the given conversion endpoint.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> ExtractResult<Self> {
        let timeout = Duration::from_secs(timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExtractError::Http)?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }
}

#[async_trait]
impl Extract for CloudExtractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> ExtractResult<Extraction> {
        debug!(
            "Sending {} ({} bytes) to cloud extraction",
            filename,
            bytes.len()
        );

        let mut request = self
            .client
            .post(&self.api_base)
            .header("content-type", "application/octet-stream")
            .header("x-filename", filename)
            .body(bytes.to_vec());

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                ExtractError::Connection {
                    url: self.api_base.clone(),
                }
            } else if e.is_timeout() {
                ExtractError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                ExtractError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let extraction: Extraction = response.json().await?;
        info!(
            "Cloud extraction returned {} characters for {}",
            extraction.text.len(),
            filename
        );

        Ok(extraction)
    }
}
