//! Embedded vector store backed by SQLite.
//!
//! Vectors are stored as little-endian f32 BLOBs and searched by
//! brute-force cosine similarity, which is efficient for single-machine
//! knowledge bases (<100K points).

use crate::error::{StoreError, StoreResult};
use crate::store::VectorStore;
use async_trait::async_trait;
use distill_core::{CollectionStats, EmbeddedPoint, PointPayload, ScoredPoint};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// Type alias for connection pool.
pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Current schema version.
const SCHEMA_VERSION: i32 = 1;

/// Embedded local vector store.
#[derive(Clone)]
pub struct LocalStore {
    pool: ConnectionPool,
}

impl LocalStore {
    /// Open a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Other(e.to_string()))?;
        }

        info!("Opening vector store at: {}", path.display());

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        {
            let conn = pool.get()?;
            initialize_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        // Memory DB only supports a single connection
        let pool = Pool::builder().max_size(1).build(manager)?;

        {
            let conn = pool.get()?;
            initialize_schema(&conn)?;
        }

        Ok(Self { pool })
    }

    fn conn(&self) -> StoreResult<PooledConn> {
        self.pool.get().map_err(StoreError::from)
    }

    fn collection_dimension(&self, conn: &Connection, collection: &str) -> StoreResult<usize> {
        let dim: Option<i64> = conn
            .query_row(
                "SELECT dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()?;

        dim.map(|d| d as usize)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }
}

fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version == 0 {
        info!("Creating vector store schema...");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS points (
                collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
                id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                vector BLOB NOT NULL,
                dimensions INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_points_collection ON points(collection);
            CREATE INDEX IF NOT EXISTS idx_points_document ON points(collection, document_id);
            "#,
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot_product += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8], dimensions: usize) -> Vec<f32> {
    blob.chunks(4)
        .take(dimensions)
        .map(|bytes| {
            if bytes.len() == 4 {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            } else {
                0.0
            }
        })
        .collect()
}

#[async_trait]
impl VectorStore for LocalStore {
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, dimension) VALUES (?1, ?2)",
            params![collection, dimension as i64],
        )?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[EmbeddedPoint]) -> StoreResult<()> {
        let conn = self.conn()?;
        let dimension = self.collection_dimension(&conn, collection)?;

        for point in points {
            if point.vector.len() != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: dimension,
                    actual: point.vector.len(),
                });
            }

            // Updates keep the original seq so insertion-order tie-breaks
            // stay stable across re-ingestion.
            conn.execute(
                r#"
                INSERT INTO points
                    (collection, id, document_id, filename, chunk_index,
                     content, token_count, vector, dimensions, seq)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                        (SELECT COALESCE(MAX(seq), 0) + 1 FROM points))
                ON CONFLICT (collection, id) DO UPDATE SET
                    document_id = excluded.document_id,
                    filename = excluded.filename,
                    chunk_index = excluded.chunk_index,
                    content = excluded.content,
                    token_count = excluded.token_count,
                    vector = excluded.vector,
                    dimensions = excluded.dimensions
                "#,
                params![
                    collection,
                    point.id,
                    point.payload.document_id,
                    point.payload.filename,
                    point.payload.chunk_index as i64,
                    point.payload.text,
                    point.payload.token_count as i64,
                    vector_to_blob(&point.vector),
                    point.vector.len() as i64,
                ],
            )?;
        }

        debug!("Upserted {} points into '{}'", points.len(), collection);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> StoreResult<Vec<ScoredPoint>> {
        let conn = self.conn()?;
        self.collection_dimension(&conn, collection)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, filename, chunk_index, content,
                   token_count, vector, dimensions
            FROM points
            WHERE collection = ?1
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let id: String = row.get(0)?;
            let payload = PointPayload {
                document_id: row.get(1)?,
                filename: row.get(2)?,
                chunk_index: row.get::<_, i64>(3)? as usize,
                text: row.get(4)?,
                token_count: row.get::<_, i64>(5)? as usize,
            };
            let blob: Vec<u8> = row.get(6)?;
            let dimensions: i64 = row.get(7)?;
            Ok((id, payload, blob, dimensions))
        })?;

        let mut results: Vec<ScoredPoint> = Vec::new();
        for row_result in rows {
            let (id, payload, blob, dimensions) = row_result?;
            let vector = blob_to_vector(&blob, dimensions as usize);
            let score = cosine_similarity(query_vector, &vector);
            results.push(ScoredPoint { id, score, payload });
        }

        // Stable sort preserves insertion order among equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn stats(&self, collection: &str) -> StoreResult<CollectionStats> {
        let conn = self.conn()?;
        let dimension = self.collection_dimension(&conn, collection)?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM points WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;

        Ok(CollectionStats {
            count: count as u64,
            dimension,
        })
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distill_core::{document_id, point_id};

    fn make_point(doc: &str, chunk_index: usize, vector: Vec<f32>) -> EmbeddedPoint {
        let doc_id = document_id(doc);
        EmbeddedPoint {
            id: point_id(&doc_id, chunk_index),
            vector,
            payload: PointPayload {
                document_id: doc_id,
                filename: doc.to_string(),
                chunk_index,
                text: format!("chunk {} of {}", chunk_index, doc),
                token_count: 10,
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);

        // Orthogonal vectors
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 0.0001);

        // Opposite vectors
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - (-1.0)).abs() < 0.0001);

        // Empty and mismatched vectors
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_vector_blob_roundtrip() {
        let vector = vec![0.25f32, -1.5, 3.75, 0.0];
        let blob = vector_to_blob(&vector);
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_vector(&blob, 4), vector);
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let store = LocalStore::open_in_memory().unwrap();
        store.ensure_collection("docs", 4).await.unwrap();

        let points = vec![
            make_point("a.pdf", 0, vec![1.0, 0.0, 0.0, 0.0]),
            make_point("a.pdf", 1, vec![0.0, 1.0, 0.0, 0.0]),
        ];
        store.upsert("docs", &points).await.unwrap();

        let results = store
            .search("docs", &[0.9, 0.1, 0.0, 0.0], 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].payload.chunk_index, 0);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_sorted_non_increasing() {
        let store = LocalStore::open_in_memory().unwrap();
        store.ensure_collection("docs", 3).await.unwrap();

        let points = vec![
            make_point("a.pdf", 0, vec![0.2, 0.8, 0.0]),
            make_point("a.pdf", 1, vec![1.0, 0.0, 0.0]),
            make_point("a.pdf", 2, vec![0.5, 0.5, 0.0]),
        ];
        store.upsert("docs", &points).await.unwrap();

        let results = store.search("docs", &[1.0, 0.0, 0.0], 10).await.unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = LocalStore::open_in_memory().unwrap();
        store.ensure_collection("docs", 2).await.unwrap();

        let points = vec![
            make_point("a.pdf", 0, vec![1.0, 0.0]),
            make_point("a.pdf", 1, vec![0.0, 1.0]),
        ];
        store.upsert("docs", &points).await.unwrap();
        store.upsert("docs", &points).await.unwrap();

        let stats = store.stats("docs").await.unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.dimension, 2);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_error() {
        let store = LocalStore::open_in_memory().unwrap();

        let err = store.stats("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));

        let err = store.search("missing", &[1.0], 5).await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = LocalStore::open_in_memory().unwrap();
        store.ensure_collection("docs", 4).await.unwrap();

        let bad = vec![make_point("a.pdf", 0, vec![1.0, 0.0])];
        let err = store.upsert("docs", &bad).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_list_collections() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(store.list_collections().await.unwrap().is_empty());

        store.ensure_collection("beta", 4).await.unwrap();
        store.ensure_collection("alpha", 4).await.unwrap();
        store.ensure_collection("alpha", 4).await.unwrap();

        let names = store.list_collections().await.unwrap();
        assert_eq!(names, vec!["alpha".to_string(), "beta".to_string()]);
    }
}
