//! Trellis CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Static site artifacts from architecture models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Site root containing trellis.toml (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate index documents and diagram images for every model source
    Generate {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate, then regenerate whenever a model source changes
    Watch,
    /// Print the application interaction matrix of a plateau as JSON
    Matrix {
        /// Name of the plateau element
        #[arg(short, long)]
        plateau: String,

        /// Model source (defaults to the first discovered source)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Weakest relationship followed when deriving interactions
        #[arg(long)]
        min_weight: Option<u32>,
    },
    /// Print the elements of the given types as JSON
    Catalog {
        /// Comma-separated element types, e.g. Principle,Goal
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<String>,

        /// Model source (defaults to the first discovered source)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },
    /// Remove generated artifacts
    Clean,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("trellis={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Trellis v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Site root: {}", cli.root.display());

    match cli.command {
        Commands::Generate { json } => commands::generate(cli.root, json),
        Commands::Watch => commands::watch(cli.root).await,
        Commands::Matrix {
            plateau,
            source,
            min_weight,
        } => commands::matrix(cli.root, source, &plateau, min_weight),
        Commands::Catalog { types, source } => commands::catalog(cli.root, source, &types),
        Commands::Clean => commands::clean(cli.root),
        Commands::Version => {
            println!("Trellis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
