//! Initialize Distill.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use distill_config::Config;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    // Check if already initialized
    if paths.is_initialized() {
        println!("{} Distill is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Data: {}", paths.data_dir.display());
        return Ok(());
    }

    println!("{}", "Initializing Distill...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    println!();
    println!("{}", "Distill initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit config: {}", "distill config edit".cyan());
    println!("  2. Export your API key: {}", "export OPENAI_API_KEY=...".cyan());
    println!(
        "  3. Ingest a document: {}",
        "distill ingest report.pdf".cyan()
    );

    Ok(())
}
