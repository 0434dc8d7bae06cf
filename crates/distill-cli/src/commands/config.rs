//! Configuration commands.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

pub fn show() -> Result<()> {
    let paths = get_paths()?;

    if !paths.config_file.exists() {
        anyhow::bail!("Config file not found. Run 'distill init' first.");
    }

    let contents =
        std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("{}", contents);

    Ok(())
}

pub fn edit() -> Result<()> {
    let paths = get_paths()?;

    if !paths.config_file.exists() {
        anyhow::bail!("Config file not found. Run 'distill init' first.");
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| {
        if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            "nano".to_string()
        }
    });

    let parts: Vec<&str> = editor.split_whitespace().collect();
    let (cmd, args) = parts.split_first().context("Invalid editor command")?;

    let status = Command::new(cmd)
        .args(args)
        .arg(&paths.config_file)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with error");
    }

    println!("{} Configuration saved.", "✓".green());

    Ok(())
}
