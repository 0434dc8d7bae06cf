//! Qdrant REST backend for the vector store.

use crate::error::{StoreError, StoreResult};
use crate::store::VectorStore;
use async_trait::async_trait;
use distill_config::QdrantConfig;
use distill_core::{CollectionStats, EmbeddedPoint, PointPayload, ScoredPoint};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Points per upsert request. Large documents are written in slices so a
/// single oversized request is never sent.
const UPSERT_BATCH: usize = 100;

/// Networked vector store speaking Qdrant's REST API.
#[derive(Clone)]
pub struct QdrantStore {
    client: Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct PointStruct<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: &'a PointPayload,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: Vec<PointStruct<'a>>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: serde_json::Value,
    score: f32,
    payload: PointPayload,
}

#[derive(Debug, Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    points_count: u64,
    config: CollectionConfig,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: VectorInfo,
}

#[derive(Debug, Deserialize)]
struct VectorInfo {
    size: usize,
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    result: CollectionsList,
}

#[derive(Debug, Deserialize)]
struct CollectionsList {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

impl QdrantStore {
    /// Create a client from configuration.
    pub fn from_config(config: &QdrantConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Other("Qdrant URL is not configured".to_string()))?;
        Self::new(url, config.api_key.clone(), config.timeout_seconds)
    }

    /// Create a client for the given server URL.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> StoreResult<Self> {
        let timeout = Duration::from_secs(timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::Http)?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{}", self.url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() {
            StoreError::Connection {
                url: self.url.clone(),
            }
        } else if e.is_timeout() {
            StoreError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            StoreError::Http(e)
        }
    }

    async fn error_from_response(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::ApiError { status, message }
    }

    async fn collection_info(&self, collection: &str) -> StoreResult<CollectionInfo> {
        let response = self
            .request(reqwest::Method::GET, &format!("/collections/{}", collection))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let info: CollectionInfoResponse = response.json().await?;
        Ok(info.result)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> StoreResult<()> {
        match self.collection_info(collection).await {
            Ok(_) => return Ok(()),
            Err(StoreError::CollectionNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        info!("Creating Qdrant collection '{}' (dim={})", collection, dimension);
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimension,
                distance: "Cosine",
            },
        };

        let response = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", collection))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[EmbeddedPoint]) -> StoreResult<()> {
        for batch in points.chunks(UPSERT_BATCH) {
            let body = UpsertRequest {
                points: batch
                    .iter()
                    .map(|p| PointStruct {
                        id: &p.id,
                        vector: &p.vector,
                        payload: &p.payload,
                    })
                    .collect(),
            };

            let response = self
                .request(
                    reqwest::Method::PUT,
                    &format!("/collections/{}/points?wait=true", collection),
                )
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?;

            if response.status() == StatusCode::NOT_FOUND {
                return Err(StoreError::CollectionNotFound(collection.to_string()));
            }
            if !response.status().is_success() {
                return Err(Self::error_from_response(response).await);
            }

            debug!("Upserted {} points into '{}'", batch.len(), collection);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>> {
        let body = SearchRequest {
            vector: query_vector,
            limit,
            with_payload: true,
        };

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: match hit.id.as_str() {
                    Some(s) => s.to_string(),
                    None => hit.id.to_string(),
                },
                score: hit.score,
                payload: hit.payload,
            })
            .collect())
    }

    async fn stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        let info = self.collection_info(collection).await?;
        Ok(CollectionStats {
            count: info.points_count,
            dimension: info.config.params.vectors.size,
        })
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let response = self
            .request(reqwest::Method::GET, "/collections")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let parsed: CollectionsResponse = response.json().await?;
        Ok(parsed
            .result
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = QdrantConfig {
            url: Some("http://localhost:6333/".to_string()),
            api_key: None,
            collection: "documents".to_string(),
            timeout_seconds: 30,
        };
        let store = QdrantStore::from_config(&config).unwrap();
        assert_eq!(store.url, "http://localhost:6333");
    }

    #[test]
    fn test_missing_url_is_error() {
        let config = QdrantConfig::default();
        assert!(QdrantStore::from_config(&config).is_err());
    }

    #[test]
    fn test_search_request_shape() {
        let body = SearchRequest {
            vector: &[0.1, 0.2],
            limit: 5,
            with_payload: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["limit"], 5);
        assert_eq!(json["with_payload"], true);
        assert_eq!(json["vector"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_search_response_parses_uuid_and_integer_ids() {
        let raw = r#"{
            "result": [
                {
                    "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                    "score": 0.87,
                    "payload": {
                        "document_id": "d1",
                        "filename": "a.pdf",
                        "chunk_index": 0,
                        "text": "hello",
                        "token_count": 2
                    }
                },
                {
                    "id": 42,
                    "score": 0.5,
                    "payload": {
                        "document_id": "d1",
                        "filename": "a.pdf",
                        "chunk_index": 1,
                        "text": "world",
                        "token_count": 2
                    }
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result.len(), 2);
        assert_eq!(
            parsed.result[0].id.as_str(),
            Some("7c9e6679-7425-40de-944b-e07fc1f90ae7")
        );
    }
}
