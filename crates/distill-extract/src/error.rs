//! Extraction error types.

use thiserror::Error;

/// Errors that can occur during document extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Extracted text too short: {length} characters (minimum {minimum})")]
    BelowQualityGate { length: usize, minimum: usize },

    #[error("Cloud extraction is not configured")]
    NotConfigured,

    #[error("Cannot reach extraction service at {url}")]
    Connection { url: String },

    #[error("Extraction request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
