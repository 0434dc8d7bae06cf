//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub qdrant: QdrantConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &PathBuf) -> ConfigResult<()> {
        let default_config = Self::default_config_string();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config)?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Distill Configuration
# Document ingestion and extraction-faithful content generation

[general]
# Data directory for the embedded vector store
# data_dir = "~/.local/share/distill"

[openai]
# Base URL of an OpenAI-compatible API
api_base = "https://api.openai.com/v1"

# Environment variable holding the API key
api_key_env = "OPENAI_API_KEY"

# Model used for content generation
model = "gpt-4o-mini"

# Model used for embeddings
embedding_model = "text-embedding-3-small"

# Embedding vector dimensionality
embedding_dimensions = 1536

# Request timeout in seconds
timeout_seconds = 120

[qdrant]
# Qdrant server URL. Leave unset to use the embedded local store.
# url = "https://your-cluster.cloud.qdrant.io:6333"

# API key for Qdrant Cloud
# api_key = ""

# Default collection for ingested documents
collection = "documents"

[extraction]
# Conversion API used when local extraction fails or falls below the
# quality gate. Leave unset to disable the fallback.
# cloud_api_base = "https://api.example.com/convert"

# Environment variable holding the conversion API key
cloud_api_key_env = "EXTRACTION_API_KEY"

# Minimum extracted length (characters) before falling back to the cloud
min_text_length = 100

# Extraction request timeout in seconds
timeout_seconds = 300

[chunking]
# Tokens per chunk
chunk_size = 1000

# Token overlap between consecutive chunks
chunk_overlap = 200

[generation]
# Number of passages retrieved per request
top_k = 5

# Minimum cosine similarity for a passage to be used (-1.0 to 1.0)
min_similarity = 0.3

# Minimum words for a passage to count as substantive
min_passage_words = 8

# Sampling temperature for generation
temperature = 0.2
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// OpenAI-compatible API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key_env: String,
    pub model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            timeout_seconds: 120,
        }
    }
}

/// Qdrant backend settings. When `url` is unset the embedded local store
/// is used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_seconds: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            collection: "documents".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Extraction collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub cloud_api_base: Option<String>,
    pub cloud_api_key_env: String,
    pub min_text_length: usize,
    pub timeout_seconds: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            cloud_api_base: None,
            cloud_api_key_env: "EXTRACTION_API_KEY".to_string(),
            min_text_length: 100,
            timeout_seconds: 300,
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Generation and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub top_k: usize,
    pub min_similarity: f32,
    pub min_passage_words: usize,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.3,
            min_passage_words: 8,
            temperature: 0.2,
        }
    }
}
