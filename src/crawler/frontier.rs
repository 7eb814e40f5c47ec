//! Crawl frontier
//!
//! A FIFO queue of pages waiting to be fetched. Entries are normalized before
//! they are queued, so everything that comes out of the frontier is ready to
//! be checked against the visited index and fetched.

use crate::url::{is_on_site, normalize_url, NormalizedUrl};
use crate::UrlError;
use std::collections::VecDeque;
use url::Url;

/// A snapshot entry that could not be queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSeed {
    pub link: String,
    pub error: UrlError,
}

/// Breadth-first queue of pending pages
///
/// Duplicates are tolerated; the crawl loop checks the visited index when
/// links are queued and again when they are popped.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<NormalizedUrl>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the starting frontier for a run
    ///
    /// The links left by the previous run are queued in order, each
    /// normalized against `site`. Links that fail normalization or point off
    /// the site are returned separately and never queued. When the snapshot holds no usable link
    /// the frontier starts from `default_url` alone.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Links saved by the previous run, in visiting order
    /// * `default_url` - Seed page used when there is nothing to resume
    /// * `site` - Base URL host-relative entries are resolved against
    /// * `allowed_domains` - Extra host patterns that count as on-site
    ///
    /// # Returns
    ///
    /// The seeded frontier and the snapshot entries that were dropped
    pub fn seed(
        snapshot: &[String],
        default_url: NormalizedUrl,
        site: &Url,
        allowed_domains: &[String],
    ) -> (Self, Vec<RejectedSeed>) {
        let mut frontier = Self::new();
        let mut rejected = Vec::new();

        for link in snapshot {
            match normalize_url(link, site) {
                Ok(url) if is_on_site(&url, site, allowed_domains) => frontier.push_back(url),
                Ok(url) => rejected.push(RejectedSeed {
                    link: link.clone(),
                    error: UrlError::OffSite(url.into_string()),
                }),
                Err(error) => rejected.push(RejectedSeed {
                    link: link.clone(),
                    error,
                }),
            }
        }

        if frontier.is_empty() {
            frontier.push_back(default_url);
        }

        (frontier, rejected)
    }

    /// Removes the next page to visit
    pub fn pop_front(&mut self) -> Option<NormalizedUrl> {
        self.queue.pop_front()
    }

    /// Queues a page behind everything already pending
    pub fn push_back(&mut self, url: NormalizedUrl) {
        self.queue.push_back(url);
    }

    /// Puts a page back at the head of the queue
    pub fn push_front(&mut self, url: NormalizedUrl) {
        self.queue.push_front(url);
    }

    /// Pending pages as strings, in visiting order
    pub fn snapshot(&self) -> Vec<String> {
        self.queue.iter().map(|url| url.as_str().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
