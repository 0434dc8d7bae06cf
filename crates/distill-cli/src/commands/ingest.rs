//! Ingest command - submit a document and poll the job to completion.

use super::{get_client, get_config, get_store};
use anyhow::{Context, Result};
use colored::Colorize;
use distill_core::JobState;
use distill_extract::{CloudExtractor, Extract, ExtractionRouter, LocalExtractor};
use distill_ingest::{ChunkConfig, Chunker, IngestionPipeline, JobStore};
use distill_openai::TokenCounter;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

pub fn run(path: &str, collection: Option<String>) -> Result<()> {
    let (config, paths) = get_config()?;
    let collection = collection.unwrap_or_else(|| config.qdrant.collection.clone());

    let file_path = Path::new(path);
    let bytes =
        std::fs::read(file_path).with_context(|| format!("Failed to read file: {}", path))?;
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let rt = Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let store = get_store(&config, &paths)?;
        let client = get_client(&config)?;

        let local: Box<dyn Extract> = Box::new(LocalExtractor::new());
        let cloud: Option<Box<dyn Extract>> = CloudExtractor::from_config(&config.extraction)
            .context("Failed to create cloud extractor")?
            .map(|c| Box::new(c) as Box<dyn Extract>);
        let router = Arc::new(ExtractionRouter::new(
            local,
            cloud,
            config.extraction.min_text_length,
        ));

        let tokens = Arc::new(TokenCounter::cl100k().context("Failed to load tokenizer")?);
        let chunker = Arc::new(Chunker::new(
            tokens,
            ChunkConfig::from_config(&config.chunking),
        ));

        let pipeline = IngestionPipeline::new(
            JobStore::new(),
            router,
            Arc::new(client),
            chunker,
            store,
            &collection,
        );

        println!("{} {}", "Ingesting:".cyan().bold(), filename);
        let job_id = pipeline.submit(bytes, &filename);
        println!("  Job: {}", job_id.dimmed());

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("  {spinner} {msg}")
                .context("Invalid progress template")?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        let job = loop {
            let job = pipeline.job(&job_id)?;
            spinner.set_message(job.state.to_string());
            if job.state.is_terminal() {
                break job;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        };
        spinner.finish_and_clear();

        match job.state {
            JobState::Completed => {
                let stats = job
                    .stats
                    .context("Completed job is missing its statistics")?;
                println!(
                    "{} Ingested {} chunk{} ({} tokens) into '{}'",
                    "✓".green(),
                    stats.chunk_count.to_string().green(),
                    if stats.chunk_count == 1 { "" } else { "s" },
                    stats.total_tokens,
                    collection
                );
                if let Some(method) = job.extraction_method {
                    println!("  Extraction: {}", method.to_string().dimmed());
                }
                Ok(())
            }
            _ => {
                anyhow::bail!(
                    "Ingestion failed: {}",
                    job.error.unwrap_or_else(|| "unknown error".to_string())
                )
            }
        }
    })
}
