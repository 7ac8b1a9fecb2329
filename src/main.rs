//! Khobor main entry point
//!
//! Command-line interface for the khobor news archive harvester.

use clap::Parser;
use khobor::config::load_config_with_hash;
use khobor::harvest::{build_http_client, ArticleFetcher, BatchScheduler, Watchdog};
use khobor::status::{self, ScrapeProgress};
use khobor::storage::{ArticleStore, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Khobor: an incremental news archive harvester
///
/// Khobor walks a news site's sequential article id space in concurrent
/// batches, stores everything it finds in SQLite, and resumes from the
/// highest stored id after a restart.
#[derive(Parser, Debug)]
#[command(name = "khobor")]
#[command(version = "1.0.0")]
#[command(about = "An incremental news archive harvester", long_about = None)]
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

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Validate config and show what would be harvested without starting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_run(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("khobor=info,warn"),
            1 => EnvFilter::new("khobor=debug,info"),
            2 => EnvFilter::new("khobor=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &khobor::Config) {
    println!("=== Khobor Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);

    println!("\nHarvest:");
    println!("  Concurrency: {}", config.harvest.concurrency);
    println!(
        "  Empty streak threshold: {}",
        config.harvest.empty_streak_threshold
    );
    println!("  Long sleep: {}s", config.harvest.long_sleep_secs);
    println!("  Slow response: {}s", config.harvest.slow_response_secs);
    println!("  Watchdog: {}s", config.harvest.watchdog_secs);
    println!("  Empty ceiling: {}", config.harvest.empty_ceiling);
    println!("  Fetch retries: {}", config.harvest.fetch_retries);
    println!("  Retry backoff: {}s", config.harvest.retry_backoff_secs);
    println!("  Start id: {}", config.harvest.start_id);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nServer:");
    println!("  Listen port: {}", config.server.listen_port);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &khobor::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = SqliteStore::open(Path::new(&config.storage.database_path))?;

    let count = store.count_articles()?;
    let latest = store.latest_id()?;

    println!("Articles stored: {}", count);
    match latest {
        Some(id) => println!("Highest article id: {}", id),
        None => println!("Highest article id: (store is empty)"),
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_run(config: khobor::Config) -> anyhow::Result<()> {
    // Unrecoverable store initialization is the only fatal startup error
    let store = SqliteStore::open(Path::new(&config.storage.database_path))?;
    let store = Arc::new(Mutex::new(store));
    tracing::info!(
        database = %config.storage.database_path,
        "store opened"
    );

    let progress = Arc::new(ScrapeProgress::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Graceful shutdown on interrupt
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    // Status endpoints run beside the harvest loop
    let server = tokio::spawn(status::serve(
        config.server.listen_port,
        progress.clone(),
        shutdown_rx.clone(),
    ));

    let client = build_http_client()?;
    let fetcher = ArticleFetcher::new(client, &config.source.base_url, &config.harvest);
    let watchdog = Watchdog::spawn(
        store.clone(),
        Duration::from_secs(config.harvest.watchdog_secs),
    );

    let mut scheduler = BatchScheduler::new(
        config.harvest.clone(),
        fetcher,
        store.clone(),
        progress,
        watchdog,
        shutdown_rx,
    );

    let result = scheduler.run().await;

    // Drain: stop the status server, close the store, then surface any
    // loop error
    server.abort();
    store.lock().unwrap().close()?;
    tracing::info!("store connection closed");

    result?;
    Ok(())
}
