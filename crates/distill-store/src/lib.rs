//! Distill Store - Vector storage layer for Distill.
//!
//! Exposes a single [`VectorStore`] trait with two interchangeable backends:
//! an embedded SQLite store for zero-setup local use and a Qdrant client for
//! networked deployments. The backend is selected once at startup via
//! [`open_store`]; the rest of the pipeline is backend-agnostic.

mod error;
mod local;
mod qdrant;
mod store;

pub use error::{StoreError, StoreResult};
pub use local::{cosine_similarity, LocalStore};
pub use qdrant::QdrantStore;
pub use store::{open_store, VectorStore};
