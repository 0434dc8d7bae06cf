//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] distill_extract::ExtractError),

    #[error("Chunking produced no passages")]
    EmptyChunks,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] distill_openai::OpenAiError),

    #[error("Storage failed: {0}")]
    Storage(#[from] distill_store::StoreError),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error(transparent)]
    Core(#[from] distill_core::Error),
}
