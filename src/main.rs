//! EQ Catalog main entry point
//!
//! This is the command-line interface for the resumable equipment catalog builder.

use anyhow::Context;
use clap::Parser;
use eq_catalog::config::{load_config_with_hash, Config};
use eq_catalog::crawler::{run_once, Coordinator, RunOptions};
use eq_catalog::output::{generate_markdown_summary, load_statistics, print_statistics};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// EQ Catalog: a resumable equipment catalog builder
///
/// Each invocation processes one batch of wiki item pages and persists
/// the cursor, so scheduled jobs with short time limits eventually cover
/// the whole title list.
#[derive(Parser, Debug)]
#[command(name = "eq-catalog")]
#[command(version)]
#[command(about = "Builds an equipment resistance catalog from a game wiki", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "eq-catalog.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Rebuild the title list and reset the cursor (catalog is kept)
    #[arg(long)]
    fresh: bool,

    /// Retry titles whose fetch failed instead of advancing the cursor
    #[arg(long, conflicts_with = "fresh")]
    retry_failed: bool,

    /// Validate config and show the next batch without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from persisted data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Write a markdown catalog summary and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::debug!("Configuration hash: {}", config_hash);

    let options = RunOptions {
        fresh: cli.fresh,
        retry_failed: cli.retry_failed,
    };

    if cli.dry_run {
        handle_dry_run(config, options)
    } else if cli.stats {
        handle_stats(config)
    } else if cli.export_summary {
        handle_export_summary(config)
    } else {
        let summary = run_once(config, options).await.context("Run failed")?;
        println!("{}", summary);
        Ok(())
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the run summary.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("eq_catalog=info,warn"),
            1 => EnvFilter::new("eq_catalog=debug,info"),
            2 => EnvFilter::new("eq_catalog=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: prints the effective config and the next window
fn handle_dry_run(config: Config, options: RunOptions) -> anyhow::Result<()> {
    println!("=== EQ Catalog Dry Run ===\n");

    println!("Wiki:");
    println!("  Base URL: {}", config.wiki.base_url);
    println!("  API: {}", config.wiki.api_url());

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nCrawler:");
    match config.crawler.batch_size {
        Some(size) => println!("  Batch size: {}", size),
        None => println!("  Batch size: persisted"),
    }
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Seed delay: {}ms", config.crawler.seed_delay_ms);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nStorage: {:?}", config.output.backend);

    let seeds = config.discovery_seeds();
    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    let coordinator = Coordinator::new(config).context("Failed to open storage")?;
    let preview = coordinator.preview(options)?;

    println!("\n✓ Configuration is valid");
    println!("✓ {}", preview);

    Ok(())
}

/// Handles --stats: prints statistics from persisted data
fn handle_stats(config: Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("Failed to open storage")?;
    let stats = load_statistics(coordinator.storage())?;
    print_statistics(&stats);
    Ok(())
}

/// Handles --export-summary: writes the markdown catalog summary
fn handle_export_summary(config: Config) -> anyhow::Result<()> {
    let summary_path = config.output.summary_path.clone();
    let coordinator = Coordinator::new(config).context("Failed to open storage")?;

    tracing::info!("Loading catalog from storage...");
    let stats = load_statistics(coordinator.storage())?;
    let catalog = coordinator.storage().load_catalog()?;

    generate_markdown_summary(&catalog, &stats, Path::new(&summary_path))
        .with_context(|| format!("Failed to write {}", summary_path))?;

    println!("✓ Summary exported to: {}", summary_path);
    Ok(())
}
