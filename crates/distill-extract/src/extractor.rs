//! The extraction collaborator interface.

use crate::error::ExtractResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text extracted from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    #[serde(default = "default_page_count")]
    pub page_count: usize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

fn default_page_count() -> usize {
    1
}

impl Extraction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_count: 1,
            title: None,
            author: None,
        }
    }

    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A collaborator that turns raw document bytes into text.
#[async_trait]
pub trait Extract: Send + Sync {
    async fn extract(&self, bytes: &[u8], filename: &str) -> ExtractResult<Extraction>;
}
