//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties everything together:
//! - Popping pages from the frontier in breadth-first order
//! - Skipping pages the visited index already holds
//! - Fetching and extracting pages through a `PageSource`
//! - Writing records to the sink and counting inserts against the cap
//! - Qualifying discovered links and queueing the new ones
//! - Applying the fetch error policy
//!
//! `run_crawl` wraps a `Coordinator` with the on-disk state: it loads the
//! snapshot and the sink before the loop and writes the snapshot after it.

use crate::config::{Config, CrawlerConfig, FetchErrorPolicy};
use crate::crawler::events::{CrawlEvent, CrawlObserver, SkipReason, TracingObserver};
use crate::crawler::fetcher::{FetchError, HttpPageSource, PageSource};
use crate::crawler::frontier::{Frontier, RejectedSeed};
use crate::state::{RunSnapshot, VisitedIndex};
use crate::storage::{open_sink, PageRecord, RecordSink};
use crate::url::{is_on_site, normalize_url, qualify_link, NormalizedUrl};
use crate::{ReelError, Result, UrlError};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use url::Url;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The frontier ran out of pages
    Drained,
    /// The insert cap was reached
    CapReached,
    /// A fetch failed under the abort policy
    Aborted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drained => write!(f, "drained"),
            Self::CapReached => write!(f, "reached insert cap"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// The fetch failure that stopped an aborted run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortCause {
    pub url: NormalizedUrl,
    pub error: FetchError,
}

/// Outcome of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub termination: Termination,

    /// Records written to the sink
    pub inserted: u32,

    /// Pages fetched successfully, with or without a record
    pub visited_this_run: u32,

    /// Pages popped but not written: already visited or without a record
    pub skipped: u32,

    /// Links and snapshot entries that were not queued
    pub rejected_links: u32,

    /// Fetch attempts that failed, retries included
    pub failed_fetches: u32,

    pub frontier_remaining: usize,

    /// Set when `termination` is `Aborted`
    pub abort: Option<AbortCause>,
}

impl CrawlReport {
    fn new() -> Self {
        Self {
            termination: Termination::Drained,
            inserted: 0,
            visited_this_run: 0,
            skipped: 0,
            rejected_links: 0,
            failed_fetches: 0,
            frontier_remaining: 0,
            abort: None,
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns every piece of crawl state for one run. Nothing here touches the
/// snapshot file; callers take the remaining frontier with
/// [`Coordinator::snapshot`] once [`Coordinator::run`] returns.
pub struct Coordinator<S, K, O> {
    site: Url,
    allowed_domains: Vec<String>,
    max_inserts: u32,
    policy: FetchErrorPolicy,
    fetch_retries: u32,
    source: S,
    sink: K,
    observer: O,
    visited: VisitedIndex,
    frontier: Frontier,
    rejected_seeds: Vec<RejectedSeed>,
    attempts: HashMap<NormalizedUrl, u32>,
    report: CrawlReport,
}

impl<S, K, O> Coordinator<S, K, O>
where
    S: PageSource,
    K: RecordSink,
    O: CrawlObserver,
{
    /// Creates a new coordinator instance
    ///
    /// The visited index is loaded from `sink` and the frontier is seeded
    /// from `snapshot`, falling back to the configured seed URL. Snapshot
    /// entries that cannot be normalized or lie off-site are reported as
    /// rejected links when the run starts.
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler section of the configuration
    /// * `source` - Where pages are fetched from
    /// * `sink` - Where records are written; also the source of the visited index
    /// * `observer` - Receives crawl events
    /// * `snapshot` - Frontier left by the previous run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ReelError)` - Bad site or seed URL, or the sink could not be read
    pub fn new(
        config: &CrawlerConfig,
        source: S,
        sink: K,
        observer: O,
        snapshot: &RunSnapshot,
    ) -> Result<Self> {
        let site = config.site_url()?;
        let seed = normalize_url(&config.seed_url, &site)?;
        let visited = VisitedIndex::load(&sink, &site)?;

        let (frontier, rejected_seeds) =
            Frontier::seed(&snapshot.links, seed, &site, &config.allowed_domains);

        Ok(Self {
            site,
            allowed_domains: config.allowed_domains.clone(),
            max_inserts: config.max_inserts,
            policy: config.on_fetch_error,
            fetch_retries: config.fetch_retries,
            source,
            sink,
            observer,
            visited,
            frontier,
            rejected_seeds,
            attempts: HashMap::new(),
            report: CrawlReport::new(),
        })
    }

    /// Runs the main crawl loop
    ///
    /// # Loop
    ///
    /// 1. Pop the next page; stop with `Drained` when there is none
    /// 2. Skip it if the visited index holds it
    /// 3. Fetch and extract it
    ///    - On success: mark it visited, write its record if it has one,
    ///      queue its unvisited on-site links, and stop with `CapReached`
    ///      once `max_inserts` records were written
    ///    - On failure: apply the fetch error policy
    ///
    /// Sink errors end the run immediately and are returned as errors.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.observer.on_event(&CrawlEvent::CrawlStarted {
            frontier: self.frontier.len(),
            visited: self.visited.len(),
            max_inserts: self.max_inserts,
        });

        for seed in std::mem::take(&mut self.rejected_seeds) {
            self.reject_link(None, seed.link, seed.error);
        }

        let termination = loop {
            let Some(url) = self.frontier.pop_front() else {
                break Termination::Drained;
            };

            if self.visited.contains(&url) {
                self.skip(url, SkipReason::AlreadyVisited);
                continue;
            }

            match self.source.fetch_page(&url).await {
                Ok(page) => {
                    self.visited.mark_visited(url.clone());
                    self.report.visited_this_run += 1;

                    match page.record {
                        Some(details) => {
                            let record = PageRecord {
                                url: url.clone(),
                                title: details.title,
                                release_year: details.release_year,
                                running_time: details.running_time,
                                fetched_at: Utc::now(),
                            };
                            self.sink.insert(&record)?;
                            self.report.inserted += 1;

                            self.observer.on_event(&CrawlEvent::PageVisited {
                                url: url.clone(),
                                title: record.title,
                                inserted: self.report.inserted,
                                links_found: page.links.len(),
                            });
                        }
                        None => self.skip(url.clone(), SkipReason::NoRecord),
                    }

                    self.enqueue_links(&url, page.links);

                    if self.report.inserted >= self.max_inserts {
                        break Termination::CapReached;
                    }
                }
                Err(error) => {
                    if self.handle_fetch_error(url, error) {
                        break Termination::Aborted;
                    }
                }
            }
        };

        self.report.termination = termination;
        self.report.frontier_remaining = self.frontier.len();

        self.observer.on_event(&CrawlEvent::RunTerminated {
            termination,
            inserted: self.report.inserted,
            frontier_remaining: self.report.frontier_remaining,
        });

        Ok(self.report.clone())
    }

    /// Applies the fetch error policy; returns `true` when the run must stop
    fn handle_fetch_error(&mut self, url: NormalizedUrl, error: FetchError) -> bool {
        self.report.failed_fetches += 1;

        let attempt = {
            let count = self.attempts.entry(url.clone()).or_insert(0);
            *count += 1;
            *count
        };

        match self.policy {
            FetchErrorPolicy::Abort => {
                self.observer.on_event(&CrawlEvent::FetchFailed {
                    url: url.clone(),
                    error: error.clone(),
                    attempt,
                    will_retry: false,
                });
                self.frontier.push_front(url.clone());
                self.report.abort = Some(AbortCause { url, error });
                true
            }
            FetchErrorPolicy::Skip => {
                let will_retry = attempt <= self.fetch_retries;
                self.observer.on_event(&CrawlEvent::FetchFailed {
                    url: url.clone(),
                    error,
                    attempt,
                    will_retry,
                });

                if will_retry {
                    self.frontier.push_back(url);
                } else {
                    // In memory only: the sink never sees it, so a later run retries
                    self.visited.mark_visited(url);
                }
                false
            }
        }
    }

    /// Qualifies discovered links and queues those not yet visited
    fn enqueue_links(&mut self, from: &NormalizedUrl, links: Vec<String>) {
        for link in links {
            let url = match qualify_link(&self.site, &link) {
                Ok(url) => url,
                Err(error) => {
                    self.reject_link(Some(from.clone()), link, error);
                    continue;
                }
            };

            if !is_on_site(&url, &self.site, &self.allowed_domains) {
                let error = UrlError::OffSite(url.into_string());
                self.reject_link(Some(from.clone()), link, error);
                continue;
            }

            if !self.visited.contains(&url) {
                self.frontier.push_back(url);
            }
        }
    }

    fn reject_link(&mut self, from: Option<NormalizedUrl>, link: String, error: UrlError) {
        self.report.rejected_links += 1;
        self.observer
            .on_event(&CrawlEvent::LinkRejected { from, link, error });
    }

    fn skip(&mut self, url: NormalizedUrl, reason: SkipReason) {
        self.report.skipped += 1;
        self.observer.on_event(&CrawlEvent::PageSkipped { url, reason });
    }

    /// The pending frontier, ready to be saved
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot::new(self.frontier.snapshot())
    }

    pub fn visited(&self) -> &VisitedIndex {
        &self.visited
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

/// Runs one crawl against the configured site
///
/// This function orchestrates the entire run:
///
/// 1. Load the previous run's snapshot (ignored when `fresh` is set)
/// 2. Open the record sink and build the visited index from it
/// 3. Seed the frontier and run the crawl loop over HTTP
/// 4. Write the remaining frontier to the snapshot file
///
/// The snapshot is written after every loop outcome, including an aborted
/// run, in which case the failed page is at its head and the fetch error is
/// returned afterwards. A fatal error inside the loop (a sink write) leaves
/// the previous snapshot in place.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Start from the seed URL instead of the saved snapshot
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run drained the frontier or reached the cap
/// * `Err(ReelError)` - The run failed, or was aborted by a fetch error
///
/// # Example
///
/// ```no_run
/// use reelcrawl::config::load_config;
/// use reelcrawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("reelcrawl.toml"))?;
/// let report = run_crawl(config, false).await?;
/// println!("{} records inserted", report.inserted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport> {
    let snapshot_path = Path::new(&config.output.snapshot_path);

    let snapshot = if fresh {
        tracing::info!("Fresh run requested, ignoring saved frontier");
        RunSnapshot::default()
    } else {
        RunSnapshot::load(snapshot_path)?
    };

    let sink = open_sink(&config.output)?;
    let source = HttpPageSource::from_config(&config)?;

    let mut coordinator =
        Coordinator::new(&config.crawler, source, sink, TracingObserver, &snapshot)?;
    let mut report = coordinator.run().await?;

    coordinator.snapshot().save(snapshot_path)?;
    tracing::info!(
        "Saved {} pending links to {}",
        report.frontier_remaining,
        snapshot_path.display()
    );

    if let Some(cause) = report.abort.take() {
        return Err(ReelError::Fetch {
            url: cause.url.into_string(),
            source: cause.error,
        });
    }

    Ok(report)
}
