//! OpenAI-compatible HTTP client.

use crate::embedding::{Embedder, MAX_EMBED_BATCH};
use crate::error::{OpenAiError, OpenAiResult};
use crate::generator::CompletionModel;
use crate::types::*;
use async_trait::async_trait;
use distill_config::OpenAiConfig;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Client for an OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiClient {
    /// Create a new client from configuration.
    ///
    /// The API key is read from the environment variable named in the
    /// config; a missing key is an error here, not at first request.
    pub fn from_config(config: &OpenAiConfig) -> OpenAiResult<Self> {
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| OpenAiError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;

        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OpenAiError::Http)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
            temperature: 0.2,
            timeout,
        })
    }

    /// Set the sampling temperature used for generation.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn map_send_error(&self, e: reqwest::Error) -> OpenAiError {
        if e.is_connect() {
            OpenAiError::Connection {
                url: self.api_base.clone(),
            }
        } else if e.is_timeout() {
            OpenAiError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OpenAiError::Http(e)
        }
    }

    async fn post<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> OpenAiResult<reqwest::Response> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OpenAiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> OpenAiResult<Vec<Vec<f32>>> {
        if texts.len() > MAX_EMBED_BATCH {
            return Err(OpenAiError::BatchTooLarge {
                size: texts.len(),
                max: MAX_EMBED_BATCH,
            });
        }

        debug!(
            "Embedding {} texts with model {}",
            texts.len(),
            self.embedding_model
        );

        let request = EmbeddingsRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response = self.post("/embeddings", &request).await?;
        let parsed: EmbeddingsResponse = response.json().await?;

        if parsed.data.len() != texts.len() {
            return Err(OpenAiError::CountMismatch {
                sent: texts.len(),
                received: parsed.data.len(),
            });
        }

        // The provider orders by `index`; re-sort to be safe.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        for item in &data {
            if item.embedding.len() != self.embedding_dimensions {
                return Err(OpenAiError::DimensionMismatch {
                    expected: self.embedding_dimensions,
                    actual: item.embedding.len(),
                });
            }
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.embedding_dimensions
    }
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> OpenAiResult<String> {
        debug!("Generating with model {}", self.model);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: self.temperature,
        };

        let response = self.post("/chat/completions", &request).await?;
        let parsed: ChatResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OpenAiError::EmptyCompletion)
    }
}
