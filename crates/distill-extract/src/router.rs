//! Quality-gated routing between the local and cloud extractors.

use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{Extract, Extraction};
use distill_core::ExtractionMethod;
use tracing::{info, warn};

/// Tries local extraction first and falls back to the cloud collaborator
/// when the result fails the quality gate.
pub struct ExtractionRouter {
    local: Box<dyn Extract>,
    cloud: Option<Box<dyn Extract>>,
    min_text_length: usize,
}

impl ExtractionRouter {
    pub fn new(
        local: Box<dyn Extract>,
        cloud: Option<Box<dyn Extract>>,
        min_text_length: usize,
    ) -> Self {
        Self {
            local,
            cloud,
            min_text_length,
        }
    }

    /// Extract text from `bytes`, recording which path produced it.
    ///
    /// Local output shorter than the quality gate counts as a local
    /// failure. When no cloud extractor is configured, the local failure
    /// is the final answer.
    pub async fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> ExtractResult<(Extraction, ExtractionMethod)> {
        let local_failure = match self.local.extract(bytes, filename).await {
            Ok(extraction) => {
                let length = extraction.text.trim().chars().count();
                if length >= self.min_text_length {
                    info!(
                        "Local extraction succeeded for {} ({} characters)",
                        filename, length
                    );
                    return Ok((extraction, ExtractionMethod::Local));
                }
                ExtractError::BelowQualityGate {
                    length,
                    minimum: self.min_text_length,
                }
            }
            Err(e) => e,
        };

        let Some(cloud) = &self.cloud else {
            return Err(local_failure);
        };

        warn!(
            "Local extraction failed for {} ({}); falling back to cloud",
            filename, local_failure
        );

        let extraction = cloud.extract(bytes, filename).await?;
        Ok((extraction, ExtractionMethod::CloudFallback))
    }
}
