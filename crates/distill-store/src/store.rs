//! The backend-agnostic vector store interface.

use crate::error::StoreResult;
use crate::local::LocalStore;
use crate::qdrant::QdrantStore;
use async_trait::async_trait;
use distill_config::Config;
use distill_core::{CollectionStats, EmbeddedPoint, ScoredPoint};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Persistent storage for embedded points with nearest-neighbor search.
///
/// Upsert is idempotent per point identifier: re-writing a point replaces
/// its vector and payload. Multi-point upserts carry no transactional
/// guarantee; a failure mid-write leaves earlier points in place.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not already exist.
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> StoreResult<()>;

    /// Insert or overwrite points by identifier.
    async fn upsert(&self, collection: &str, points: &[EmbeddedPoint]) -> StoreResult<()>;

    /// Return up to `limit` points ranked by cosine similarity, strictly
    /// non-increasing; ties break by insertion order.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>>;

    /// Point count and vector dimensionality of a collection.
    /// Unknown collections are an error, not an empty default.
    async fn stats(&self, collection: &str) -> StoreResult<CollectionStats>;

    /// Names of all collections in the store.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;
}

/// Select and open the configured backend.
///
/// Qdrant when `qdrant.url` is set, the embedded local store otherwise.
/// The choice is made once here; callers hold the trait object.
pub fn open_store(config: &Config, store_file: &Path) -> StoreResult<Arc<dyn VectorStore>> {
    match config.qdrant.url.as_deref() {
        Some(url) => {
            info!("Using Qdrant vector store at {}", url);
            Ok(Arc::new(QdrantStore::from_config(&config.qdrant)?))
        }
        None => {
            info!("Using embedded vector store at {}", store_file.display());
            Ok(Arc::new(LocalStore::open(store_file)?))
        }
    }
}
