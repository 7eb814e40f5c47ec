//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageSource` trait
//! - Record and related-link extraction
//! - The breadth-first frontier
//! - Overall crawl coordination and the event stream it reports through

mod coordinator;
mod events;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, AbortCause, Coordinator, CrawlReport, Termination};
pub use events::{CrawlEvent, CrawlObserver, SkipReason, TracingObserver};
pub use fetcher::{build_http_client, FetchError, HttpPageSource, PageSource};
pub use frontier::{Frontier, RejectedSeed};
pub use parser::{extract_page, ExtractRules, ExtractedPage, PageDetails};
