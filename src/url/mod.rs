//! URL handling module for Reelcrawl
//!
//! This module provides the normalized URL type used as the crawl's identity
//! key, link qualification against the crawled site, and site scoping.

mod normalize;

use crate::UrlError;
use serde::Serialize;
use std::fmt;
use url::Url;

// Re-export main functions
pub use normalize::{normalize_url, qualify_link};

/// A URL reduced to scheme, host, port and path
///
/// Two links that normalize to the same value are the same page everywhere:
/// Visited Index keys, sink primary keys and frontier entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Wraps an already-normalized URL
    fn from_url(url: &Url) -> Self {
        Self(url.as_str().to_string())
    }

    /// Returns the URL as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the URL back into a `Url`
    pub fn to_url(&self) -> Result<Url, UrlError> {
        Url::parse(&self.0).map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// Consumes the wrapper and returns the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the lowercase host from a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches a pattern
///
/// `"imdb.com"` matches only itself; `"*.imdb.com"` matches `imdb.com` and
/// any subdomain of it.
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => candidate == base || candidate.ends_with(&format!(".{}", base)),
        None => candidate == pattern,
    }
}

/// Checks whether a normalized URL belongs to the crawled site
///
/// A URL is on-site when its host equals the site's host, or matches one of
/// the extra `allowed_domains` patterns (exact or `*.` wildcard).
///
/// # Examples
///
/// ```
/// use reelcrawl::url::{is_on_site, normalize_url};
/// use url::Url;
///
/// let site = Url::parse("http://www.imdb.com").unwrap();
/// let page = normalize_url("/title/tt0468569/", &site).unwrap();
/// assert!(is_on_site(&page, &site, &[]));
///
/// let other = normalize_url("https://example.org/x", &site).unwrap();
/// assert!(!is_on_site(&other, &site, &[]));
/// assert!(is_on_site(&other, &site, &["*.example.org".to_string()]));
/// ```
pub fn is_on_site(url: &NormalizedUrl, site: &Url, allowed_domains: &[String]) -> bool {
    let Some(domain) = url.to_url().ok().and_then(|u| extract_domain(&u)) else {
        return false;
    };

    if extract_domain(site).as_deref() == Some(domain.as_str()) {
        return true;
    }

    allowed_domains
        .iter()
        .any(|pattern| matches_wildcard(pattern, &domain))
}
