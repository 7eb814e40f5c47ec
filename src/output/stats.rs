//! Statistics generation from the durable crawl state
//!
//! This module provides functionality for extracting and displaying
//! statistics from the record sink and the frontier snapshot.

use crate::config::{OutputConfig, SinkKind};
use crate::crawler::{CrawlReport, Termination};
use crate::state::RunSnapshot;
use crate::storage::{open_sink, StoredRecord};
use crate::Result;
use std::path::Path;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    pub sink: SinkKind,
    pub sink_path: String,

    /// Number of records in the sink
    pub records: u64,

    /// Most recently written record
    pub latest: Option<StoredRecord>,

    pub snapshot_path: String,

    /// Links waiting in the saved frontier
    pub pending_links: usize,
}

/// Loads statistics from the sink and snapshot named in the configuration
///
/// A sink file that does not exist yet counts as empty and is not created.
///
/// # Arguments
///
/// * `config` - Output configuration naming the sink and snapshot
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(ReelError)` - The sink or snapshot could not be read
pub fn load_statistics(config: &OutputConfig) -> Result<CrawlStatistics> {
    let (records, latest) = if Path::new(&config.sink_path).exists() {
        let sink = open_sink(config)?;
        (sink.count()?, sink.latest()?)
    } else {
        (0, None)
    };

    let snapshot = RunSnapshot::load(Path::new(&config.snapshot_path))?;

    Ok(CrawlStatistics {
        sink: config.sink,
        sink_path: config.sink_path.clone(),
        records,
        latest,
        snapshot_path: config.snapshot_path.clone(),
        pending_links: snapshot.len(),
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Records ({:?} sink at {}):", stats.sink, stats.sink_path);
    println!("  Stored: {}", stats.records);

    match &stats.latest {
        Some(record) => {
            println!(
                "  Latest: {} {} [{}]",
                record.title, record.release_year, record.running_time
            );
            println!("          {}", record.url);
            if let Some(created_at) = record.created_at {
                println!("          written {}", created_at.to_rfc3339());
            }
        }
        None => println!("  Latest: none"),
    }
    println!();

    println!("Frontier ({}):", stats.snapshot_path);
    if stats.pending_links == 0 {
        println!("  Empty, the next run starts from the seed URL");
    } else {
        println!("  Pending links: {}", stats.pending_links);
    }
}

/// Prints the outcome of a finished run
pub fn print_crawl_report(report: &CrawlReport) {
    let outcome = match report.termination {
        Termination::Drained => "frontier drained",
        Termination::CapReached => "insert cap reached",
        Termination::Aborted => "aborted on fetch error",
    };

    println!("=== Crawl Finished ({}) ===\n", outcome);
    println!("  Records inserted: {}", report.inserted);
    println!("  Pages visited: {}", report.visited_this_run);
    println!("  Pages skipped: {}", report.skipped);
    println!("  Links rejected: {}", report.rejected_links);
    println!("  Failed fetches: {}", report.failed_fetches);
    println!("  Links pending: {}", report.frontier_remaining);
}
