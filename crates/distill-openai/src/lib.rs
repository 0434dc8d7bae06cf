//! Distill OpenAI - OpenAI-compatible API integration.
//!
//! This crate provides the async client used for embeddings and text
//! generation, the token counter shared by chunking and batching, the
//! provider-capped embedding batcher, and the relevance-filtered generator
//! that enforces the extraction contract.

mod client;
mod embedding;
mod error;
mod generator;
mod tokenizer;
mod types;

pub use client::OpenAiClient;
pub use embedding::{embed_in_batches, embed_one, Embedder, MAX_EMBED_BATCH};
pub use error::{OpenAiError, OpenAiResult};
pub use generator::{CompletionModel, GenerationRequest, Generator, REFUSAL_MARKER};
pub use tokenizer::TokenCounter;
pub use types::*;
