//! Collections command - list collections in the store.

use super::{get_config, get_store};
use anyhow::{Context, Result};
use colored::Colorize;
use tokio::runtime::Runtime;

pub fn run() -> Result<()> {
    let (config, paths) = get_config()?;

    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let store = get_store(&config, &paths)?;
        let names = store
            .list_collections()
            .await
            .context("Failed to list collections")?;

        if names.is_empty() {
            println!("{}", "No collections yet.".dimmed());
            println!("Ingest a document to create one: {}", "distill ingest report.pdf".cyan());
            return Ok(());
        }

        println!("{}", "Collections".cyan().bold());
        println!("{}", "─".repeat(50));
        for name in &names {
            match store.stats(name).await {
                Ok(stats) => println!(
                    "  {} {} ({} points, dim {})",
                    "•".cyan(),
                    name.white().bold(),
                    stats.count,
                    stats.dimension
                ),
                Err(_) => println!("  {} {}", "•".cyan(), name.white().bold()),
            }
        }

        Ok(())
    })
}
