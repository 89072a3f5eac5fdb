//! Board Harvest main entry point
//!
//! This is the command-line interface for the Board Harvest forum scraper.

use anyhow::Context;
use board_harvest::config::{load_config_with_hash, Config};
use board_harvest::crawler::{HttpFetcher, Orchestrator};
use board_harvest::model::BatchReport;
use board_harvest::output::{load_statistics, print_statistics, ApiForwarder, StoreSink};
use board_harvest::sites::Site;
use board_harvest::storage::{open_storage, PostStore, RunStatus};
use board_harvest::ScrapeResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Board Harvest: a paced scraper for Korean community forums
///
/// Board Harvest scrapes posts and comment threads from DCInside, FMKorea,
/// Ruliweb and Clien, one page at a time, and stores them deduplicated by
/// site and post id.
#[derive(Parser, Debug)]
#[command(name = "board-harvest")]
#[command(version)]
#[command(about = "A paced scraper for Korean community forums", long_about = None)]
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

    /// Do not write scraped posts to the database
    #[arg(long)]
    no_store: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape one or more post URLs
    Post {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },

    /// Scrape up to post-limit posts from a board listing
    Board {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Delete every stored post of a site
    DeleteSite {
        #[arg(value_name = "SITE")]
        site: Site,
    },

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Post { urls } => {
            handle_scrape(&config, &config_hash, cli.no_store, Target::Posts(urls)).await
        }
        Command::Board { url } => {
            handle_scrape(&config, &config_hash, cli.no_store, Target::Board(url)).await
        }
        Command::DeleteSite { site } => handle_delete_site(&config, site),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("board_harvest=info,warn"),
            1 => EnvFilter::new("board_harvest=debug,info"),
            2 => EnvFilter::new("board_harvest=trace,debug"),
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

enum Target {
    Posts(Vec<String>),
    Board(String),
}

/// Runs a scrape and records it as a run unless storage is disabled
async fn handle_scrape(
    config: &Config,
    config_hash: &str,
    no_store: bool,
    target: Target,
) -> anyhow::Result<()> {
    let database = Path::new(&config.output.database_path);

    for setting in config.scrape.ignored_settings() {
        tracing::warn!("'{}' has no effect: HTTP sessions are always headless", setting);
    }

    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    );

    if !no_store {
        let store = open_storage(database)
            .with_context(|| format!("failed to open {}", database.display()))?;
        orchestrator = orchestrator.with_sink(Box::new(StoreSink::new(Box::new(store))));
    }

    if let Some(api_url) = &config.scrape.api_url {
        let endpoint = Url::parse(api_url).context("invalid api-url")?;
        tracing::info!("Forwarding posts to {}", endpoint);
        let forwarder = ApiForwarder::new(endpoint, config.scrape.timeout())?;
        orchestrator = orchestrator.with_sink(Box::new(forwarder));
    }

    // Ctrl-C stops the batch between URLs
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current URL");
            cancel.cancel();
        }
    });

    // Runs are tracked on a separate connection; WAL allows both writers
    let mut runs = if no_store {
        None
    } else {
        Some(open_storage(database)?)
    };
    let run_id = match runs.as_mut() {
        Some(store) => Some(store.create_run(config_hash)?),
        None => None,
    };

    let outcome = match target {
        Target::Posts(urls) => orchestrator.scrape_posts(&urls).await,
        Target::Board(url) => orchestrator.scrape_board(&url).await,
    };

    if let (Some(store), Some(run_id)) = (runs.as_mut(), run_id) {
        let (successes, failures, status) = match &outcome {
            Ok(report) if report.cancelled => (
                report.success_count() as u64,
                report.failure_count() as u64,
                RunStatus::Interrupted,
            ),
            Ok(report) => (
                report.success_count() as u64,
                report.failure_count() as u64,
                RunStatus::Completed,
            ),
            Err(_) => (0, 0, RunStatus::Failed),
        };
        store.complete_run(run_id, successes, failures, status)?;
    }

    let report = outcome?;
    print_report(&report);
    Ok(())
}

/// Prints one line per URL and a closing tally
fn print_report(report: &BatchReport) {
    for result in &report.results {
        match result {
            ScrapeResult::Success(post) => println!(
                "✓ {}/{}  {}  ({} comments)",
                post.site,
                post.post_id,
                post.metadata.title,
                post.comments.len()
            ),
            ScrapeResult::Failure(failure) => println!(
                "✗ {}  {} (attempts: {})",
                failure.url, failure.reason, failure.attempts
            ),
        }
    }

    println!(
        "\n{} scraped, {} failed{}",
        report.success_count(),
        report.failure_count(),
        if report.cancelled { ", interrupted" } else { "" }
    );
}

/// Handles the delete-site command
fn handle_delete_site(config: &Config, site: Site) -> anyhow::Result<()> {
    let database = Path::new(&config.output.database_path);
    let mut store = open_storage(database)
        .with_context(|| format!("failed to open {}", database.display()))?;

    let removed = store.delete_site(site)?;
    tracing::info!("Deleted {} posts of {}", removed, site);
    println!("✓ Removed {} {} posts", removed, site);

    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}
