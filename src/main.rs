//! Marketplace Harvester main entry point
//!
//! This is the command-line interface for the two-phase marketplace crawler.

use anyhow::Context;
use clap::Parser;
use marketplace_harvester::config::{load_config_with_hash, validate, Config};
use marketplace_harvester::marketplace::{builtin_names, profile_for};
use marketplace_harvester::output::print_report;
use marketplace_harvester::run_harvest;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Feed URLs listed by --dry-run before the remainder is summarized
const DRY_RUN_PAGE_PREVIEW: usize = 10;

/// Marketplace Harvester: a two-phase concurrent marketplace crawler
///
/// Walks a marketplace's search feed for a search term, then fetches every
/// listed item with a fixed pool of workers and stores title, description,
/// price and image reference for each one.
#[derive(Parser, Debug)]
#[command(name = "marketplace-harvester")]
#[command(version)]
#[command(about = "A two-phase concurrent marketplace crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the feed pages that would be fetched
    #[arg(long)]
    dry_run: bool,

    /// Override the configured number of workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
        validate(&config).context("invalid --workers value")?;
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_harvest(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("marketplace_harvester=info,warn"),
            1 => EnvFilter::new("marketplace_harvester=debug,info"),
            2 => EnvFilter::new("marketplace_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the resolved plan without fetching anything
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let profile = profile_for(&config.crawler.marketplace, &config.marketplaces)?;
    let template = profile.feed_template();
    let crawler = &config.crawler;

    println!("=== Marketplace Harvester Dry Run ===\n");

    println!(
        "Marketplace: {} (built-in: {})",
        profile.name,
        builtin_names().join(", ")
    );
    println!("Search term: {}", crawler.search_term);
    println!("Workers: {}", crawler.workers);
    println!("Deduplicate item URLs: {}", crawler.dedupe);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Format: {:?}", config.output.format);
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Directory: {}", config.output.directory),
    }

    let (urls, total) = template.preview(
        &crawler.search_term,
        crawler.start_page,
        crawler.last_page,
        DRY_RUN_PAGE_PREVIEW,
    );
    println!(
        "\nFeed pages (at most {}, fewer if a page reports no results):",
        total
    );
    for url in &urls {
        println!("  {}", url);
    }
    if total > urls.len() as u64 {
        println!("  ... and {} more", total - urls.len() as u64);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing items in progress");
            interrupt.cancel();
        }
    });

    tracing::info!(
        "Harvesting {} for '{}' with {} workers",
        config.crawler.marketplace,
        config.crawler.search_term,
        config.crawler.workers
    );

    match run_harvest(&config, cancel).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
