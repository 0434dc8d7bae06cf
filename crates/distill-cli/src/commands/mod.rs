//! CLI command implementations.

pub mod collections;
pub mod config;
pub mod generate;
pub mod ingest;
pub mod init;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use distill_config::{AppPaths, Config};
use distill_openai::OpenAiClient;
use distill_store::VectorStore;
use std::sync::Arc;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load configuration, ensuring distill is initialized.
pub fn get_config() -> Result<(Config, AppPaths)> {
    let paths = get_paths()?;

    if !paths.is_initialized() {
        anyhow::bail!("Distill is not initialized. Run 'distill init' first.");
    }

    let config = Config::load_from(&paths.config_file).context("Failed to load configuration")?;
    Ok((config, paths))
}

/// Open the configured vector store backend.
pub fn get_store(config: &Config, paths: &AppPaths) -> Result<Arc<dyn VectorStore>> {
    distill_store::open_store(config, &paths.store_file).context("Failed to open vector store")
}

/// Create the provider client.
pub fn get_client(config: &Config) -> Result<OpenAiClient> {
    let client = OpenAiClient::from_config(&config.openai)
        .context("Failed to create API client")?
        .with_temperature(config.generation.temperature);
    Ok(client)
}

/// Truncate a string to a maximum length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
