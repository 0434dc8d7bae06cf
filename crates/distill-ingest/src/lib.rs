//! Distill Ingest - Document ingestion pipeline.
//!
//! This crate provides:
//! - Token-aware text chunking with configurable overlap
//! - An owned, queryable job table
//! - The ingestion state machine driving extraction, chunking, embedding,
//!   and vector store injection for each submitted document

mod chunker;
mod error;
mod jobs;
mod pipeline;

pub use chunker::{ChunkConfig, Chunker};
pub use error::{IngestError, IngestResult};
pub use jobs::JobStore;
pub use pipeline::IngestionPipeline;
