//! Chunkload CLI
//!
//! Split a CSV source, transform-load chunks in parallel, and merge the
//! per-chunk SQLite stores into one consolidated store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chunkload::{build_runtime, run_pipeline, Config, TransformRegistry};

#[derive(Parser)]
#[command(name = "chunkload")]
#[command(about = "Chunked parallel CSV-to-SQLite loader", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Override worker concurrency
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Override maximum rows per chunk
    #[arg(long, global = true)]
    max_rows: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline (default if no command specified)
    Run {
        /// Name of the registered transform to apply
        #[arg(short, long, default_value = "identity")]
        transform: String,
    },

    /// Validate configuration
    Validate,

    /// List registered transforms
    ListTransforms,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        None => run_command(&cli, "identity"),
        Some(Commands::Run { transform }) => run_command(&cli, &transform.clone()),
        Some(Commands::Validate) => validate_command(&cli.config),
        Some(Commands::ListTransforms) => {
            let registry = TransformRegistry::new();
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
        Some(Commands::GenerateConfig { output }) => generate_config_command(output.clone()),
    }
}

fn run_command(cli: &Cli, transform_name: &str) -> Result<()> {
    let mut config = Config::from_file(&cli.config)?;

    // Apply overrides
    if let Some(c) = cli.concurrency {
        config.processing.concurrency = c;
    }
    if let Some(m) = cli.max_rows {
        config.processing.max_rows = m;
    }

    config.validate()?;

    let registry = TransformRegistry::new();
    let transform = registry
        .get(transform_name)
        .with_context(|| format!("unknown transform '{transform_name}'"))?;

    let runtime = build_runtime(config.processing.worker_threads)?;
    let report = runtime.block_on(async { run_pipeline(config, transform).await })?;

    println!("{}", report.final_store.display());
    Ok(())
}

fn validate_command(config_path: &PathBuf) -> Result<()> {
    let config = Config::from_file(config_path)?;
    config.validate()?;
    println!("Configuration is valid");
    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    let yaml = r#"# Chunkload Pipeline Configuration

# === INPUT ===
input:
  # Delimited-record source file
  source: "data.csv"

  # Existing SQLite database holding exactly one table; its schema is
  # cloned into every per-chunk store
  template: "template.db"

  # Whether the first record names the fields
  has_header: true

# === OUTPUT ===
output:
  # Directory for chunk files (output-N.csv), per-chunk stores
  # (output-N.db) and the final store (output.db). Created if missing.
  # Intermediate files are left behind for the caller to clean up.
  dir: "out"

# === PROCESSING ===
processing:
  # Maximum data rows per chunk
  max_rows: 100000

  # Concurrent chunk workers (defaults to available CPU parallelism)
  # concurrency: 8

  # Tokio worker threads (null = num CPUs)
  # worker_threads: 8
"#;

    std::fs::write(&output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}
