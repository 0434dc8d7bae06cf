//! Error types for OpenAI-compatible API operations.

use thiserror::Error;

/// Errors that can occur when interacting with the provider.
#[derive(Error, Debug)]
pub enum OpenAiError {
    /// API key environment variable is unset.
    #[error("API key not found: set the {var} environment variable")]
    MissingApiKey { var: String },

    /// Connection error - unable to reach the API.
    #[error("Cannot reach API at {url}")]
    Connection { url: String },

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A single embedding request exceeded the provider's batch cap.
    #[error("Embedding batch of {size} exceeds the provider limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Provider returned a different number of vectors than inputs.
    #[error("Embedding count mismatch: sent {sent} inputs, received {received} vectors")]
    CountMismatch { sent: usize, received: usize },

    /// Embedding dimension mismatch.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The completion response carried no choices.
    #[error("Empty completion response")]
    EmptyCompletion,

    /// Tokenizer initialization or decoding failure.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Vector store failure while answering a query.
    #[error("Vector store error: {0}")]
    Store(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for provider operations.
pub type OpenAiResult<T> = Result<T, OpenAiError>;

impl From<distill_store::StoreError> for OpenAiError {
    fn from(err: distill_store::StoreError) -> Self {
        OpenAiError::Store(err.to_string())
    }
}
