//! Generate command - extraction-faithful content generation.

use super::{get_client, get_config, get_store, truncate};
use anyhow::{Context, Result};
use colored::Colorize;
use distill_openai::{GenerationRequest, Generator};
use std::sync::Arc;
use tokio::runtime::Runtime;

pub fn run(
    keywords: &str,
    instructions: &str,
    top_k: usize,
    collection: Option<String>,
    no_sources: bool,
) -> Result<()> {
    let (config, paths) = get_config()?;
    let collection = collection.unwrap_or_else(|| config.qdrant.collection.clone());

    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let store = get_store(&config, &paths)?;
        let client = Arc::new(get_client(&config)?);
        let generator = Generator::new(client.clone(), client, store)
            .with_threshold(config.generation.min_similarity)
            .with_min_passage_words(config.generation.min_passage_words);

        println!("{} {}", "Keywords:".cyan().bold(), keywords);
        println!("{}", "─".repeat(70));
        println!();

        let request = GenerationRequest {
            keywords: keywords.to_string(),
            instructions: instructions.to_string(),
            top_k,
            collection,
        };

        let response = generator
            .generate(&request)
            .await
            .context("Generation failed")?;

        match &response.generated_text {
            Some(text) => {
                println!("{}", text);
            }
            None => {
                println!(
                    "{} No passage cleared the relevance threshold ({:.0}%); nothing was generated.",
                    "Note:".yellow(),
                    response.threshold * 100.0
                );
                println!();
                println!("Suggestions:");
                println!("  • Try different keywords");
                println!("  • Check that relevant documents have been ingested");
                return Ok(());
            }
        }

        if !no_sources && !response.sources.is_empty() {
            println!();
            println!("{}", "Sources".white().bold());
            println!("{}", "─".repeat(70));
            for source in &response.sources {
                println!(
                    "{} {} {} {:.0}%",
                    "•".cyan(),
                    source.filename.white().bold(),
                    format!("[chunk {}]", source.chunk_index).dimmed(),
                    source.similarity * 100.0
                );
                println!("  {}", truncate(&source.text, 150).dimmed());
            }
        }

        Ok(())
    })
}
