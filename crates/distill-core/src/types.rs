//! Core domain types for Distill.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for ingestion jobs.
pub type JobId = String;

/// Unique identifier for source documents.
pub type DocumentId = String;

/// Fixed namespace for deriving deterministic identifiers.
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_42d7_9c3e_4a58_8d21_70ab_55e0_91c4);

/// Generate a new unique job ID.
pub fn new_job_id() -> JobId {
    Uuid::new_v4().to_string()
}

/// Derive the stable identifier of a document from its source filename.
///
/// Re-ingesting a file with the same name yields the same identifier, so its
/// points overwrite the previous ingestion instead of accumulating.
pub fn document_id(filename: &str) -> DocumentId {
    Uuid::new_v5(&ID_NAMESPACE, filename.as_bytes()).to_string()
}

/// Derive the stable point identifier for one chunk of a document.
pub fn point_id(document_id: &str, chunk_index: usize) -> String {
    let key = format!("{}:{}", document_id, chunk_index);
    Uuid::new_v5(&ID_NAMESPACE, key.as_bytes()).to_string()
}

/// Lifecycle state of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Extracting,
    Chunking,
    Embedding,
    Injecting,
    Completed,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Extracting => "extracting",
            JobState::Chunking => "chunking",
            JobState::Embedding => "embedding",
            JobState::Injecting => "injecting",
            JobState::Completed => "completed",
            JobState::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "queued" => Some(JobState::Queued),
            "extracting" => Some(JobState::Extracting),
            "chunking" => Some(JobState::Chunking),
            "embedding" => Some(JobState::Embedding),
            "injecting" => Some(JobState::Injecting),
            "completed" => Some(JobState::Completed),
            "error" => Some(JobState::Error),
            _ => None,
        }
    }

    /// Terminal states cannot be left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }

    /// Whether `next` is a legal successor of this state.
    ///
    /// The pipeline advances strictly forward; `Error` is reachable from any
    /// non-terminal state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobState::Error {
            return true;
        }
        matches!(
            (self, next),
            (JobState::Queued, JobState::Extracting)
                | (JobState::Extracting, JobState::Chunking)
                | (JobState::Chunking, JobState::Embedding)
                | (JobState::Embedding, JobState::Injecting)
                | (JobState::Injecting, JobState::Completed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which extraction path produced a job's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    Local,
    CloudFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Local => "local",
            ExtractionMethod::CloudFallback => "cloud-fallback",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final statistics of a completed ingestion job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobStats {
    pub chunk_count: usize,
    pub total_tokens: usize,
}

/// One document's tracked ingestion lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub filename: String,
    pub state: JobState,
    pub extraction_method: Option<ExtractionMethod>,
    pub error: Option<String>,
    pub stats: Option<JobStats>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_job_id(),
            filename: filename.into(),
            state: JobState::Queued,
            extraction_method: None,
            error: None,
            stats: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance to `next`, rejecting illegal transitions.
    ///
    /// This is the only way job state changes; callers never assign
    /// `self.state` directly.
    pub fn advance(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to the terminal `Error` state with the underlying cause.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.advance(JobState::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Move to `Completed` and record final statistics.
    pub fn complete(&mut self, stats: JobStats) -> Result<()> {
        self.advance(JobState::Completed)?;
        self.stats = Some(stats);
        Ok(())
    }
}

/// Maximum length of a passage preview, in characters.
const PREVIEW_CHARS: usize = 120;

/// A token-bounded slice of a document's extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Zero-based position within the source document.
    pub chunk_index: usize,
    pub text: String,
    pub token_count: usize,
    pub char_count: usize,
    /// Short prefix for listings and logs.
    pub preview: String,
    /// Byte length of the leading region shared with the previous passage.
    /// Zero for the first passage of a document.
    pub overlap_len: usize,
}

impl Passage {
    pub fn new(chunk_index: usize, text: impl Into<String>, token_count: usize) -> Self {
        let text = text.into();
        Self {
            chunk_index,
            char_count: text.chars().count(),
            preview: preview_of(&text),
            token_count,
            text,
            overlap_len: 0,
        }
    }

    pub fn with_overlap_len(mut self, overlap_len: usize) -> Self {
        self.overlap_len = overlap_len;
        self
    }
}

fn preview_of(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", head)
    }
}

/// Metadata stored alongside each vector in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub document_id: DocumentId,
    pub filename: String,
    pub chunk_index: usize,
    pub text: String,
    pub token_count: usize,
}

/// A passage vector plus its payload, ready for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedPoint {
    /// Deterministic identifier derived from document ID and chunk index.
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// One ranked hit from a nearest-neighbor search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    pub payload: PointPayload,
}

/// Collection-level statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollectionStats {
    pub count: u64,
    pub dimension: usize,
}

/// A retrieved passage cited as source material for generated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    pub document_id: DocumentId,
    pub filename: String,
    pub chunk_index: usize,
    pub text: String,
    pub similarity: f32,
}

/// Result of a content-generation request.
///
/// `generated_text` is `None` when no retrieved passage cleared the
/// relevance threshold or the model declined to extract; the caller can
/// audit `sources` and `threshold` either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub generated_text: Option<String>,
    pub sources: Vec<SourceReference>,
    pub threshold: f32,
}

impl GenerationResponse {
    /// The defined empty outcome: nothing relevant enough to extract from.
    pub fn refusal(threshold: f32) -> Self {
        Self {
            generated_text: None,
            sources: Vec::new(),
            threshold,
        }
    }

    pub fn is_refusal(&self) -> bool {
        self.generated_text.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_roundtrip() {
        for state in [
            JobState::Queued,
            JobState::Extracting,
            JobState::Chunking,
            JobState::Embedding,
            JobState::Injecting,
            JobState::Completed,
            JobState::Error,
        ] {
            assert_eq!(JobState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(JobState::from_str("bogus"), None);
    }

    #[test]
    fn test_legal_pipeline_walk() {
        let mut job = Job::new("report.pdf");
        assert_eq!(job.state, JobState::Queued);

        job.advance(JobState::Extracting).unwrap();
        job.advance(JobState::Chunking).unwrap();
        job.advance(JobState::Embedding).unwrap();
        job.advance(JobState::Injecting).unwrap();
        job.complete(JobStats {
            chunk_count: 3,
            total_tokens: 1200,
        })
        .unwrap();

        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.stats.unwrap().chunk_count, 3);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut job = Job::new("report.pdf");

        // Cannot skip ahead.
        assert!(job.advance(JobState::Embedding).is_err());

        // Terminal states cannot be left.
        job.advance(JobState::Extracting).unwrap();
        job.fail("extraction exploded").unwrap();
        assert!(job.advance(JobState::Chunking).is_err());
        assert!(job.advance(JobState::Error).is_err());
        assert_eq!(job.error.as_deref(), Some("extraction exploded"));
    }

    #[test]
    fn test_error_reachable_from_any_nonterminal_state() {
        for state in [
            JobState::Queued,
            JobState::Extracting,
            JobState::Chunking,
            JobState::Embedding,
            JobState::Injecting,
        ] {
            assert!(state.can_transition_to(JobState::Error));
        }
        assert!(!JobState::Completed.can_transition_to(JobState::Error));
    }

    #[test]
    fn test_deterministic_point_ids() {
        let doc = document_id("notes.pdf");
        assert_eq!(doc, document_id("notes.pdf"));
        assert_ne!(doc, document_id("other.pdf"));

        assert_eq!(point_id(&doc, 0), point_id(&doc, 0));
        assert_ne!(point_id(&doc, 0), point_id(&doc, 1));
    }

    #[test]
    fn test_passage_preview_truncates() {
        let long = "x".repeat(500);
        let passage = Passage::new(0, long, 400);
        assert!(passage.preview.chars().count() <= 120);
        assert!(passage.preview.ends_with("..."));
        assert_eq!(passage.char_count, 500);
    }

    #[test]
    fn test_refusal_response() {
        let resp = GenerationResponse::refusal(0.3);
        assert!(resp.is_refusal());
        assert!(resp.sources.is_empty());
        assert_eq!(resp.threshold, 0.3);
    }
}
