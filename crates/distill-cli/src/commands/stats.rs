//! Stats command - collection statistics.

use super::{get_config, get_store};
use anyhow::{Context, Result};
use colored::Colorize;
use tokio::runtime::Runtime;

pub fn run(collection: Option<String>) -> Result<()> {
    let (config, paths) = get_config()?;
    let collection = collection.unwrap_or_else(|| config.qdrant.collection.clone());

    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let store = get_store(&config, &paths)?;
        let stats = store
            .stats(&collection)
            .await
            .with_context(|| format!("Failed to read stats for '{}'", collection))?;

        println!("{}", "Collection Statistics".cyan().bold());
        println!("{}", "─".repeat(50));
        println!();
        println!("  Collection: {}", collection.white().bold());
        println!("  Points: {}", stats.count.to_string().green());
        println!("  Dimension: {}", stats.dimension);

        Ok(())
    })
}
