//! In-process document extraction.

use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{Extract, Extraction};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Extractor for digital PDFs and plain-text documents.
///
/// Runs entirely in-process; scanned PDFs produce little or no text here
/// and are caught by the router's quality gate.
pub struct LocalExtractor;

impl LocalExtractor {
    /// Create a new local extractor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extract for LocalExtractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> ExtractResult<Extraction> {
        if bytes.starts_with(b"%PDF") {
            debug!("Extracting PDF text locally: {}", filename);

            let raw = pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;

            // Page breaks come through as form feeds.
            let page_count = raw.matches('\x0C').count().max(1);
            let text = clean_text(&raw);

            debug!("Extracted {} characters from {}", text.len(), filename);

            let mut extraction = Extraction::new(text).with_page_count(page_count);
            if let Some(title) = title_from_filename(filename) {
                extraction = extraction.with_title(title);
            }
            return Ok(extraction);
        }

        // Plain text and markdown pass through unchanged.
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                debug!("Treating {} as plain text", filename);
                let mut extraction = Extraction::new(text);
                if let Some(title) = title_from_filename(filename) {
                    extraction = extraction.with_title(title);
                }
                Ok(extraction)
            }
            Err(_) => Err(ExtractError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Clean up extracted PDF text.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        // Collapse runs of blank lines
        .fold(Vec::new(), |mut acc, line| {
            let last_was_empty = acc.last().map(|s: &String| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line.to_string());
            }
            acc
        })
        .join("\n")
        .replace('\x0C', "\n\n")
}

fn title_from_filename(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let extractor = LocalExtractor::new();
        let text = "Quarterly results were strong.\n\nRevenue grew 12%.";

        let extraction = extractor.extract(text.as_bytes(), "notes.md").await.unwrap();

        assert_eq!(extraction.text, text);
        assert_eq!(extraction.page_count, 1);
        assert_eq!(extraction.title.as_deref(), Some("notes"));
    }

    #[tokio::test]
    async fn test_binary_garbage_rejected() {
        let extractor = LocalExtractor::new();
        let err = extractor
            .extract(&[0xFF, 0xFE, 0x00, 0x80], "blob.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_pdf_error() {
        let extractor = LocalExtractor::new();
        let err = extractor
            .extract(b"%PDF-1.7 this is not really a pdf", "broken.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_clean_text() {
        let messy = "  Hello  \n\n\n\nWorld  \n\nTest";
        let cleaned = clean_text(messy);
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.starts_with("Hello"));
    }
}
