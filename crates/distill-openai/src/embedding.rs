//! Provider-capped embedding batching.

use crate::error::{OpenAiError, OpenAiResult};
use async_trait::async_trait;
use tracing::debug;

/// Maximum inputs per embedding request. Provider-imposed; a larger
/// request is rejected outright, so this is a hard constant rather than
/// a tunable.
pub const MAX_EMBED_BATCH: usize = 100;

/// Anything that can turn a batch of texts into fixed-dimension vectors
/// with a single provider request.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed up to [`MAX_EMBED_BATCH`] texts in one request, preserving
    /// input order.
    async fn embed(&self, texts: &[String]) -> OpenAiResult<Vec<Vec<f32>>>;

    /// Dimensionality of the vectors this embedder produces.
    fn dimension(&self) -> usize;
}

/// Embed any number of texts, partitioning into provider-sized batches.
///
/// Returns one vector per input in the original order. The first failed
/// batch fails the whole operation; there is no partial success.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
) -> OpenAiResult<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(MAX_EMBED_BATCH) {
        let mut batch_vectors = embedder.embed(batch).await?;
        vectors.append(&mut batch_vectors);
    }

    debug!(
        "Embedded {} texts in {} batches",
        texts.len(),
        texts.len().div_ceil(MAX_EMBED_BATCH)
    );

    Ok(vectors)
}

/// Embed a single text, e.g. a search query.
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> OpenAiResult<Vec<f32>> {
    let mut vectors = embedder.embed(&[text.to_string()]).await?;
    if vectors.is_empty() {
        return Err(OpenAiError::CountMismatch {
            sent: 1,
            received: 0,
        });
    }
    Ok(vectors.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the size of every batch it receives and encodes each input's
    /// numeric value as a one-dimensional vector.
    struct RecordingEmbedder {
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl RecordingEmbedder {
        fn new() -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed(&self, texts: &[String]) -> OpenAiResult<Vec<Vec<f32>>> {
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| vec![t.parse::<f32>().unwrap_or(-1.0)])
                .collect())
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> OpenAiResult<Vec<Vec<f32>>> {
            Err(OpenAiError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_250_texts_split_into_three_batches() {
        let embedder = RecordingEmbedder::new();
        let texts: Vec<String> = (0..250).map(|i| i.to_string()).collect();

        let vectors = embed_in_batches(&embedder, &texts).await.unwrap();

        assert_eq!(*embedder.batch_sizes.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(vectors.len(), 250);
        // Reassembled in original order
        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector[0], i as f32);
        }
    }

    #[tokio::test]
    async fn test_small_input_is_one_batch() {
        let embedder = RecordingEmbedder::new();
        let texts: Vec<String> = (0..7).map(|i| i.to_string()).collect();

        let vectors = embed_in_batches(&embedder, &texts).await.unwrap();
        assert_eq!(*embedder.batch_sizes.lock().unwrap(), vec![7]);
        assert_eq!(vectors.len(), 7);
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_requests() {
        let embedder = RecordingEmbedder::new();
        let vectors = embed_in_batches(&embedder, &[]).await.unwrap();
        assert!(vectors.is_empty());
        assert!(embedder.batch_sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_fails_everything() {
        let texts: Vec<String> = (0..3).map(|i| i.to_string()).collect();
        let err = embed_in_batches(&FailingEmbedder, &texts).await.unwrap_err();
        assert!(matches!(err, OpenAiError::ApiError { .. }));
    }

    #[tokio::test]
    async fn test_embed_one() {
        let embedder = RecordingEmbedder::new();
        let vector = embed_one(&embedder, "42").await.unwrap();
        assert_eq!(vector, vec![42.0]);
    }
}
