//! Output module for reporting on crawl state
//!
//! This module handles:
//! - Reading statistics back from the record sink and the saved frontier
//! - Printing them for `--stats`
//! - Printing the outcome of a finished run

pub mod stats;

pub use stats::{load_statistics, print_crawl_report, print_statistics, CrawlStatistics};
