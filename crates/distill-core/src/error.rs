//! Error types for Distill.

use crate::types::JobState;
use thiserror::Error;

/// Core error type for Distill operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Illegal job transition: {from} -> {to}")]
    IllegalTransition { from: JobState, to: JobState },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using Distill's core Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
