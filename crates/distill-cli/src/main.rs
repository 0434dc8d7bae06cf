//! Distill CLI - Document ingestion and extraction-faithful content generation.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Distill - turn documents into a searchable knowledge base and extract
/// content from it without fabrication.
#[derive(Parser)]
#[command(name = "distill")]
#[command(version)]
#[command(about = "Document ingestion and extraction-faithful content generation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Distill (create config and data directories)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Ingest a document and wait for the job to finish
    Ingest {
        /// Path to the document to ingest
        path: String,

        /// Collection to inject into (default: from config)
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Semantic search over ingested passages
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Collection to search (default: from config)
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Generate content extracted verbatim from relevant passages
    Generate {
        /// Keywords used for retrieval
        #[arg(short, long)]
        keywords: String,

        /// Instructions for selecting and arranging passages
        #[arg(short, long)]
        instructions: String,

        /// Number of passages to retrieve before filtering
        #[arg(short, long, default_value = "5")]
        top_k: usize,

        /// Collection to search (default: from config)
        #[arg(short, long)]
        collection: Option<String>,

        /// Hide the source passages in the output
        #[arg(long)]
        no_sources: bool,
    },

    /// Show statistics for a collection
    Stats {
        /// Collection name (default: from config)
        collection: Option<String>,
    },

    /// List all collections
    Collections,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Open config file in editor
    Edit,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("distill=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("distill=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Edit => commands::config::edit(),
        },
        Commands::Ingest { path, collection } => commands::ingest::run(&path, collection),
        Commands::Search {
            query,
            limit,
            collection,
        } => commands::search::run(&query, limit, collection),
        Commands::Generate {
            keywords,
            instructions,
            top_k,
            collection,
            no_sources,
        } => commands::generate::run(&keywords, &instructions, top_k, collection, no_sources),
        Commands::Stats { collection } => commands::stats::run(collection),
        Commands::Collections => commands::collections::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
