//! Distill Extract - Document text extraction.
//!
//! Two collaborators sit behind the [`Extract`] trait: an in-process
//! extractor for digital PDFs and plain text, and a cloud conversion API
//! used only as fallback for scanned or low-quality input. The
//! [`ExtractionRouter`] applies the quality gate and records which path
//! produced the text.

mod cloud;
mod error;
mod extractor;
mod local;
mod router;

pub use cloud::CloudExtractor;
pub use error::{ExtractError, ExtractResult};
pub use extractor::{Extract, Extraction};
pub use local::LocalExtractor;
pub use router::ExtractionRouter;
