//! Reelcrawl main entry point
//!
//! This is the command-line interface for the Reelcrawl related-title crawler.

use anyhow::{Context, Result};
use clap::Parser;
use reelcrawl::config::{load_config_with_hash, validate, Config};
use reelcrawl::crawler::run_crawl;
use reelcrawl::output::{load_statistics, print_crawl_report, print_statistics};
use reelcrawl::state::RunSnapshot;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reelcrawl: a resumable related-title crawler
///
/// Reelcrawl follows a site's related-title links breadth-first, writes one
/// record per title page, and saves its remaining frontier so the next
/// invocation continues where this one stopped.
#[derive(Parser, Debug)]
#[command(name = "reelcrawl")]
#[command(version)]
#[command(about = "A resumable related-title crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many records are inserted
    #[arg(long, value_name = "N")]
    max_inserts: Option<u32>,

    /// Page to start from when there is no saved frontier
    #[arg(long, value_name = "URL")]
    seed_url: Option<String>,

    /// Record sink file (CSV or SQLite, per config)
    #[arg(long, value_name = "PATH")]
    sink_path: Option<String>,

    /// Frontier snapshot file
    #[arg(long, value_name = "PATH")]
    snapshot_path: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from the seed URL, ignoring the saved frontier
    #[arg(long)]
    fresh: bool,

    /// Validate config and show where the next run would start
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the sink and snapshot and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, cli.fresh, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reelcrawl=info,warn"),
            1 => EnvFilter::new("reelcrawl=debug,info"),
            2 => EnvFilter::new("reelcrawl=trace,debug"),
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

/// Loads the config file (or defaults), applies CLI overrides and validates
fn load_effective_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    if let Some(max_inserts) = cli.max_inserts {
        config.crawler.max_inserts = max_inserts;
    }
    if let Some(seed_url) = &cli.seed_url {
        config.crawler.seed_url = seed_url.clone();
    }
    if let Some(sink_path) = &cli.sink_path {
        config.output.sink_path = sink_path.clone();
    }
    if let Some(snapshot_path) = &cli.snapshot_path {
        config.output.snapshot_path = snapshot_path.clone();
    }

    validate(&config).context("Invalid configuration after applying command-line overrides")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows where the run would start
fn handle_dry_run(config: &Config, fresh: bool) -> Result<()> {
    println!("=== Reelcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Site: {}", config.crawler.site);
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max inserts: {}", config.crawler.max_inserts);
    println!("  On fetch error: {:?}", config.crawler.on_fetch_error);
    println!("  Fetch retries: {}", config.crawler.fetch_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    if !config.crawler.allowed_domains.is_empty() {
        println!(
            "  Allowed domains: {}",
            config.crawler.allowed_domains.join(", ")
        );
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Sink: {:?} at {}", config.output.sink, config.output.sink_path);
    println!("  Snapshot: {}", config.output.snapshot_path);

    println!("\nSelectors:");
    println!("  Record: {}", config.selectors.record);
    println!("  Title: {}", config.selectors.title);
    println!("  Year: {}", config.selectors.year);
    println!("  Running time: {}", config.selectors.running_time);
    println!("  Related item: {}", config.selectors.related_item);

    let snapshot = if fresh {
        RunSnapshot::default()
    } else {
        RunSnapshot::load(Path::new(&config.output.snapshot_path))
            .context("Failed to read frontier snapshot")?
    };

    println!("\n✓ Configuration is valid");
    if snapshot.is_empty() {
        println!("✓ Would start from the seed URL {}", config.crawler.seed_url);
    } else {
        println!(
            "✓ Would resume with {} pending links, starting at {}",
            snapshot.len(),
            snapshot.links[0]
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the sink and snapshot
fn handle_stats(config: &Config) -> Result<()> {
    let stats = load_statistics(&config.output).context("Failed to load statistics")?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool, quiet: bool) -> Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring saved frontier)");
    } else {
        tracing::info!("Starting crawl (will resume from saved frontier if present)");
    }

    let report = run_crawl(config, fresh).await.context("Crawl failed")?;

    if !quiet {
        print_crawl_report(&report);
    }

    Ok(())
}
