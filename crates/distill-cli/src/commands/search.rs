//! Search command - semantic search over ingested passages.

use super::{get_client, get_config, get_store, truncate};
use anyhow::{Context, Result};
use colored::Colorize;
use distill_openai::Generator;
use std::sync::Arc;
use tokio::runtime::Runtime;

pub fn run(query: &str, limit: usize, collection: Option<String>) -> Result<()> {
    let (config, paths) = get_config()?;
    let collection = collection.unwrap_or_else(|| config.qdrant.collection.clone());

    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let store = get_store(&config, &paths)?;
        let client = Arc::new(get_client(&config)?);
        let generator = Generator::new(client.clone(), client, store);

        println!("{} \"{}\"", "Searching for:".cyan().bold(), query);
        println!("{}", "─".repeat(70));

        let hits = generator
            .search(query, limit, &collection)
            .await
            .context("Search failed")?;

        if hits.is_empty() {
            println!();
            println!("{}", "No results found.".dimmed());
            println!();
            println!("Tips:");
            println!("  • Try different keywords");
            println!("  • Make sure documents have been ingested");
            return Ok(());
        }

        println!();
        println!(
            "Found {} passage{}",
            hits.len().to_string().green(),
            if hits.len() == 1 { "" } else { "s" }
        );
        println!();

        for hit in &hits {
            println!(
                "{} {} {}",
                "•".cyan(),
                hit.payload.filename.white().bold(),
                format!("[chunk {}]", hit.payload.chunk_index).dimmed()
            );
            println!("  {} {:.0}%", "Similarity:".dimmed(), hit.score * 100.0);
            println!("  {}", truncate(&hit.payload.text, 150).dimmed());
            println!();
        }

        Ok(())
    })
}
