//! Relevance-filtered content generation under an extraction contract.
//!
//! The generator retrieves passages, drops anything below the relevance
//! threshold, and constrains the model to *select and copy* from what
//! survives. The model never sees a request when nothing clears the
//! threshold, and its output is always returned alongside the passages
//! and scores it was given, so callers can audit the claim against its
//! source.

use crate::embedding::{embed_one, Embedder};
use crate::error::OpenAiResult;
use async_trait::async_trait;
use distill_core::{GenerationResponse, ScoredPoint, SourceReference};
use distill_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Sentinel the model is instructed to reply with when no passage
/// satisfies the instructions. Mapped to a refusal response.
pub const REFUSAL_MARKER: &str = "NO_RELEVANT_CONTENT";

/// A text-generation model invocation.
///
/// Treated as untrusted and non-deterministic; its output is interpreted
/// through the extraction contract, never passed through blindly.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> OpenAiResult<String>;
}

/// One content-generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Keyword string embedded for retrieval.
    pub keywords: String,
    /// Caller instructions for selecting and arranging passages.
    pub instructions: String,
    /// Number of passages to retrieve before filtering.
    pub top_k: usize,
    /// Collection to search.
    pub collection: String,
}

/// Retrieval plus extraction-contract generation.
pub struct Generator {
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn CompletionModel>,
    store: Arc<dyn VectorStore>,
    threshold: f32,
    min_passage_words: usize,
}

impl Generator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn CompletionModel>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            embedder,
            model,
            store,
            threshold: 0.3,
            min_passage_words: 8,
        }
    }

    /// Minimum cosine similarity, in [-1, 1], for a passage to be used.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_min_passage_words(mut self, min_passage_words: usize) -> Self {
        self.min_passage_words = min_passage_words;
        self
    }

    /// Raw semantic search: embed the query and return ranked hits with
    /// no threshold applied.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        collection: &str,
    ) -> OpenAiResult<Vec<ScoredPoint>> {
        let vector = embed_one(self.embedder.as_ref(), query).await?;
        let hits = self.store.search(collection, &vector, limit).await?;
        Ok(hits)
    }

    /// Produce a generation response for `request`.
    ///
    /// An empty post-filter result is the defined refusal outcome, not an
    /// error; embedding and storage failures are errors.
    pub async fn generate(&self, request: &GenerationRequest) -> OpenAiResult<GenerationResponse> {
        // The query goes through the same embedding path as ingestion, so
        // the vectors live in the same space.
        let vector = embed_one(self.embedder.as_ref(), &request.keywords).await?;
        let hits = self
            .store
            .search(&request.collection, &vector, request.top_k)
            .await?;

        let retrieved = hits.len();
        let relevant: Vec<ScoredPoint> = hits
            .into_iter()
            .filter(|hit| hit.score >= self.threshold)
            .collect();

        debug!(
            "Retrieved {} passages, {} above threshold {}",
            retrieved,
            relevant.len(),
            self.threshold
        );

        if relevant.is_empty() {
            info!(
                "No passage cleared threshold {} for '{}'; refusing without generation",
                self.threshold, request.keywords
            );
            return Ok(GenerationResponse::refusal(self.threshold));
        }

        let system = build_system_prompt(self.min_passage_words);
        let prompt = build_extraction_prompt(&request.instructions, &relevant);
        let output = self.model.complete(&system, &prompt).await?;

        let sources: Vec<SourceReference> = relevant
            .iter()
            .map(|hit| SourceReference {
                document_id: hit.payload.document_id.clone(),
                filename: hit.payload.filename.clone(),
                chunk_index: hit.payload.chunk_index,
                text: hit.payload.text.clone(),
                similarity: hit.score,
            })
            .collect();

        let trimmed = output.trim();
        let generated_text = if trimmed.is_empty() || trimmed == REFUSAL_MARKER {
            None
        } else {
            Some(trimmed.to_string())
        };

        Ok(GenerationResponse {
            generated_text,
            sources,
            threshold: self.threshold,
        })
    }
}

/// Build the fixed extraction-contract system prompt.
pub fn build_system_prompt(min_passage_words: usize) -> String {
    format!(
        r#"You assemble content from source passages retrieved from a document knowledge base.

Rules:
- Copy sentences verbatim from the passages. Never paraphrase, reword, or summarize.
- Never introduce facts, names, or numbers that do not appear in a passage.
- Omit section headers, list items, and questionnaire items.
- Use only substantive passages of at least {} words; skip the rest.
- You may select, order, and lightly format the copied text, nothing more.
- If no passage satisfies the instructions, reply with exactly {} and nothing else."#,
        min_passage_words, REFUSAL_MARKER
    )
}

/// Build the user prompt presenting the admissible passages.
pub fn build_extraction_prompt(instructions: &str, passages: &[ScoredPoint]) -> String {
    let mut prompt = String::new();

    prompt.push_str("Source passages (the only admissible material):\n");
    prompt.push_str("─────────────────────────────────────\n");

    for (i, hit) in passages.iter().enumerate() {
        prompt.push_str(&format!(
            "\n[{}] From: {} (chunk {})\n",
            i + 1,
            hit.payload.filename,
            hit.payload.chunk_index
        ));
        prompt.push_str(&hit.payload.text);
        prompt.push('\n');
    }

    prompt.push_str("\n─────────────────────────────────────\n\n");
    prompt.push_str(&format!("Instructions: {}\n", instructions));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpenAiError;
    use distill_core::{document_id, point_id, EmbeddedPoint, PointPayload};
    use distill_store::LocalStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: &[String]) -> OpenAiResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }
    }

    struct ScriptedModel {
        reply: String,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl ScriptedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, _system: &str, prompt: &str) -> OpenAiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            Ok(self.reply.clone())
        }
    }

    async fn seeded_store(vectors: &[(usize, Vec<f32>, &str)]) -> Arc<LocalStore> {
        let store = LocalStore::open_in_memory().unwrap();
        let dimension = vectors[0].1.len();
        store.ensure_collection("documents", dimension).await.unwrap();

        let doc_id = document_id("report.pdf");
        let points: Vec<EmbeddedPoint> = vectors
            .iter()
            .map(|(chunk_index, vector, text)| EmbeddedPoint {
                id: point_id(&doc_id, *chunk_index),
                vector: vector.clone(),
                payload: PointPayload {
                    document_id: doc_id.clone(),
                    filename: "report.pdf".to_string(),
                    chunk_index: *chunk_index,
                    text: text.to_string(),
                    token_count: 12,
                },
            })
            .collect();
        store.upsert("documents", &points).await.unwrap();
        Arc::new(store)
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            keywords: "revenue growth".to_string(),
            instructions: "extract statements about revenue".to_string(),
            top_k: 5,
            collection: "documents".to_string(),
        }
    }

    #[tokio::test]
    async fn test_below_threshold_refuses_without_calling_model() {
        // All stored vectors orthogonal to the query: every score is 0.
        let store = seeded_store(&[
            (0, vec![0.0, 1.0, 0.0, 0.0], "first passage"),
            (1, vec![0.0, 0.0, 1.0, 0.0], "second passage"),
            (2, vec![0.0, 0.0, 0.0, 1.0], "third passage"),
        ])
        .await;

        let model = Arc::new(ScriptedModel::new("should never be produced"));
        let generator = Generator::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0, 0.0, 0.0],
            }),
            model.clone(),
            store,
        );

        let response = generator.generate(&request()).await.unwrap();

        assert!(response.is_refusal());
        assert!(response.sources.is_empty());
        assert_eq!(response.threshold, 0.3);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generates_from_relevant_passages() {
        let store = seeded_store(&[
            (0, vec![1.0, 0.0, 0.0, 0.0], "Revenue grew 12% year over year."),
            (1, vec![0.0, 1.0, 0.0, 0.0], "Unrelated appendix material."),
        ])
        .await;

        let model = Arc::new(ScriptedModel::new("Revenue grew 12% year over year."));
        let generator = Generator::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0, 0.0, 0.0],
            }),
            model.clone(),
            store,
        );

        let response = generator.generate(&request()).await.unwrap();

        assert_eq!(
            response.generated_text.as_deref(),
            Some("Revenue grew 12% year over year.")
        );
        // Only the passage above threshold is admissible or cited.
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].chunk_index, 0);
        assert!(response.sources[0].similarity > 0.99);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let prompt = model.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("Revenue grew 12%"));
        assert!(!prompt.contains("Unrelated appendix"));
        assert!(prompt.contains("extract statements about revenue"));
    }

    #[tokio::test]
    async fn test_model_refusal_marker_maps_to_none() {
        let store = seeded_store(&[(0, vec![1.0, 0.0, 0.0, 0.0], "some passage text")]).await;

        let model = Arc::new(ScriptedModel::new(REFUSAL_MARKER));
        let generator = Generator::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0, 0.0, 0.0],
            }),
            model,
            store,
        );

        let response = generator.generate(&request()).await.unwrap();
        assert!(response.generated_text.is_none());
        // The passages were presented; provenance is still reported.
        assert_eq!(response.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_search_applies_no_threshold() {
        let store = seeded_store(&[
            (0, vec![0.0, 1.0, 0.0, 0.0], "low scoring passage"),
            (1, vec![1.0, 0.0, 0.0, 0.0], "high scoring passage"),
        ])
        .await;

        let generator = Generator::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0, 0.0, 0.0],
            }),
            Arc::new(ScriptedModel::new("")),
            store,
        );

        let hits = generator.search("anything", 10, "documents").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_error_not_refusal() {
        let store = seeded_store(&[(0, vec![1.0, 0.0, 0.0, 0.0], "text")]).await;

        let generator = Generator::new(
            Arc::new(FixedEmbedder {
                vector: vec![1.0, 0.0, 0.0, 0.0],
            }),
            Arc::new(ScriptedModel::new("")),
            store,
        );

        let mut bad = request();
        bad.collection = "missing".to_string();
        let err = generator.generate(&bad).await.unwrap_err();
        assert!(matches!(err, OpenAiError::Store(_)));
    }

    #[test]
    fn test_system_prompt_carries_contract() {
        let prompt = build_system_prompt(8);
        assert!(prompt.contains("verbatim"));
        assert!(prompt.contains("at least 8 words"));
        assert!(prompt.contains(REFUSAL_MARKER));
    }
}
