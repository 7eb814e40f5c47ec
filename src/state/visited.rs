use crate::storage::{RecordSink, StorageResult};
use crate::url::{normalize_url, NormalizedUrl};
use std::collections::HashSet;
use url::Url;

/// Set of pages already processed
///
/// Loaded from the record sink at startup, so it always covers every stored
/// record. During a run it also gains pages that yielded no record and pages
/// that failed to fetch; those additions live only in memory.
#[derive(Debug, Clone, Default)]
pub struct VisitedIndex {
    urls: HashSet<NormalizedUrl>,
}

impl VisitedIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from every URL stored in the sink
    ///
    /// Stored values are normalized against `site` before insertion. A value
    /// that cannot be normalized is logged and ignored, since no frontier
    /// entry could ever be equal to it.
    ///
    /// # Errors
    ///
    /// Any failure to read the sink is returned unchanged; starting a run
    /// with a partial index would re-insert pages that are already stored.
    pub fn load<K: RecordSink + ?Sized>(sink: &K, site: &Url) -> StorageResult<Self> {
        let mut index = Self::new();

        for stored in sink.load_urls()? {
            match normalize_url(&stored, site) {
                Ok(url) => {
                    index.urls.insert(url);
                }
                Err(e) => {
                    tracing::warn!("Ignoring stored URL '{}': {}", stored, e);
                }
            }
        }

        Ok(index)
    }

    /// Checks whether a URL has been processed
    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.urls.contains(url)
    }

    /// Records a URL as processed
    ///
    /// Returns `true` if the URL was not already in the index.
    pub fn mark_visited(&mut self, url: NormalizedUrl) -> bool {
        self.urls.insert(url)
    }

    /// Number of processed URLs
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
