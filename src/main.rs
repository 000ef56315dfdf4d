//! Command-line interface for docload
//!
//! # Usage Examples
//!
//! ```bash
//! # Check a benchmark file without running it
//! docload validate --config benchmarks/shop.yaml
//!
//! # Run it against the in-memory store and keep the JSON report
//! RUST_LOG=info docload run --config benchmarks/shop.yaml --report shop-report.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use docload::{assemble, BenchmarkConfig};
use docload_generator::InMemoryStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "docload")]
#[command(about = "Synthetic workload generator for document databases")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every phase of a benchmark
    Run {
        /// Benchmark definition (YAML)
        #[arg(long, env = "DOCLOAD_CONFIG", value_name = "PATH")]
        config: PathBuf,

        /// Write the JSON report to this file
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Parse and check a benchmark definition
    Validate {
        /// Benchmark definition (YAML)
        #[arg(long, env = "DOCLOAD_CONFIG", value_name = "PATH")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, report } => {
            let benchmark_config = BenchmarkConfig::from_file(&config)
                .with_context(|| format!("Failed to load benchmark from {config:?}"))?;
            let storage = Arc::new(InMemoryStorage::new());
            let assembled = assemble(&benchmark_config, storage.clone())?;
            let result = assembled.benchmark.run().await?;

            for phase in &result.phases {
                println!(
                    "{:<12} {:>10} ok {:>8} failed {:>10} ms {:>12.1} ops/s{}",
                    phase.phase,
                    phase.succeeded,
                    phase.failed,
                    phase.duration_ms,
                    phase.throughput(),
                    if phase.timed_out { " (timed out)" } else { "" }
                );
            }
            println!(
                "{} documents stored in {:.2}s",
                storage.total_count(),
                result.duration_secs()
            );

            if let Some(path) = report {
                std::fs::write(&path, result.to_json()?)
                    .with_context(|| format!("Failed to write report to {path:?}"))?;
                info!("Report written to {:?}", path);
            }
        }
        Commands::Validate { config } => {
            let benchmark_config = BenchmarkConfig::from_file(&config)
                .with_context(|| format!("Failed to load benchmark from {config:?}"))?;
            // Building the graph catches errors that need a generation context.
            let assembled = assemble(&benchmark_config, Arc::new(InMemoryStorage::new()))?;
            println!(
                "Benchmark '{}' is valid: {} collections, {} operations",
                benchmark_config.name,
                assembled.context.registered_collections().len(),
                assembled.operations.len()
            );
        }
    }

    Ok(())
}
