//! Crawl events
//!
//! The crawl loop reports what happens as a stream of `CrawlEvent`s handed
//! to a `CrawlObserver`. `TracingObserver` turns them into log lines for the
//! binary; tests record them to check the loop's decisions.

use crate::crawler::coordinator::Termination;
use crate::crawler::fetcher::FetchError;
use crate::url::NormalizedUrl;
use crate::UrlError;

/// Why a popped page produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Processed earlier in this run or stored by a previous one
    AlreadyVisited,
    /// Fetched, but the page has no record container
    NoRecord,
}

/// Something the crawl loop did
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    CrawlStarted {
        frontier: usize,
        visited: usize,
        max_inserts: u32,
    },

    /// A record was extracted and written to the sink
    PageVisited {
        url: NormalizedUrl,
        title: String,
        inserted: u32,
        links_found: usize,
    },

    PageSkipped {
        url: NormalizedUrl,
        reason: SkipReason,
    },

    /// A discovered link (or snapshot entry) was not queued
    ///
    /// `from` is `None` for entries of the previous run's snapshot.
    LinkRejected {
        from: Option<NormalizedUrl>,
        link: String,
        error: UrlError,
    },

    FetchFailed {
        url: NormalizedUrl,
        error: FetchError,
        attempt: u32,
        will_retry: bool,
    },

    RunTerminated {
        termination: Termination,
        inserted: u32,
        frontier_remaining: usize,
    },
}

/// Receives crawl events as they happen
pub trait CrawlObserver {
    fn on_event(&mut self, event: &CrawlEvent);
}

impl<O: CrawlObserver + ?Sized> CrawlObserver for &mut O {
    fn on_event(&mut self, event: &CrawlEvent) {
        (**self).on_event(event)
    }
}

/// Writes crawl events to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn on_event(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::CrawlStarted {
                frontier,
                visited,
                max_inserts,
            } => {
                tracing::info!(
                    "Starting crawl: {} pending, {} already visited, stopping after {} inserts",
                    frontier,
                    visited,
                    max_inserts
                );
            }
            CrawlEvent::PageVisited {
                url,
                title,
                inserted,
                links_found,
            } => {
                tracing::info!(
                    "[{}] {} ({}, {} related links)",
                    inserted,
                    title,
                    url,
                    links_found
                );
            }
            CrawlEvent::PageSkipped { url, reason } => match reason {
                SkipReason::AlreadyVisited => tracing::debug!("Already visited: {}", url),
                SkipReason::NoRecord => tracing::warn!("No record found on {}", url),
            },
            CrawlEvent::LinkRejected { from, link, error } => match from {
                Some(from) => tracing::debug!("Rejected link '{}' on {}: {}", link, from, error),
                None => tracing::warn!("Dropped snapshot entry '{}': {}", link, error),
            },
            CrawlEvent::FetchFailed {
                url,
                error,
                attempt,
                will_retry,
            } => {
                if *will_retry {
                    tracing::warn!(
                        "Fetch failed for {} (attempt {}), retrying later: {}",
                        url,
                        attempt,
                        error
                    );
                } else {
                    tracing::error!("Fetch failed for {} (attempt {}): {}", url, attempt, error);
                }
            }
            CrawlEvent::RunTerminated {
                termination,
                inserted,
                frontier_remaining,
            } => {
                tracing::info!(
                    "Crawl {}: {} records inserted, {} links pending",
                    termination,
                    inserted,
                    frontier_remaining
                );
            }
        }
    }
}
