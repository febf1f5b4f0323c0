//! Motorlot main entry point
//!
//! This is the command-line interface for the Motorlot listing crawlers.

use clap::Parser;
use motorlot::config::{load_config_with_hash, Config};
use motorlot::crawler::CrawlDriver;
use motorlot::output::JsonLinesSink;
use motorlot::sites::build_spider;
use motorlot::{SearchQuery, Site};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Motorlot: site-specific car listing crawlers
///
/// Motorlot crawls one of the supported car marketplace and auction sites,
/// extracts each vehicle listing into a uniform record, and emits the
/// records as JSON Lines.
#[derive(Parser, Debug)]
#[command(name = "motorlot")]
#[command(version = "1.0.0")]
#[command(about = "Site-specific car listing crawlers", long_about = None)]
struct Cli {
    /// Site to crawl (carsandbids, bringatrailer, autotrader, cargurus, cars)
    #[arg(value_name = "SITE")]
    site: Site,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Model year search filter
    #[arg(long)]
    year: Option<String>,

    /// Make search filter
    #[arg(long)]
    make: Option<String>,

    /// Model search filter
    #[arg(long)]
    model: Option<String>,

    /// Trim search filter
    #[arg(long)]
    trim: Option<String>,

    /// Records output path, overriding the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Stop after this many listing pages (0 = unbounded)
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration; without a config file every setting
    // takes its default.
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(output) = &cli.output {
        config.output.records_path = output.display().to_string();
    }

    let query = SearchQuery {
        year: cli.year,
        make: cli.make,
        model: cli.model,
        trim: cli.trim,
    };
    if !query.is_empty() {
        tracing::info!("Search filter: {}", query.phrase());
    }

    let sink = Arc::new(JsonLinesSink::create(std::path::Path::new(
        &config.output.records_path,
    ))?);
    tracing::info!("Writing records to: {}", config.output.records_path);

    let spider = build_spider(cli.site, &config, &query)?;
    let driver = CrawlDriver::new(config.crawler.clone(), sink);

    match driver.run(spider).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed: {} records from {} listing pages",
                stats.records_emitted,
                stats.listing_pages
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("motorlot=info,warn"),
            1 => EnvFilter::new("motorlot=debug,info"),
            2 => EnvFilter::new("motorlot=trace,debug"),
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
