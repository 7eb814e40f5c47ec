use crate::url::NormalizedUrl;
use crate::UrlError;
use url::{ParseError, Url};

/// Normalizes a raw link according to Reelcrawl's normalization rules
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Host-relative references (starting with `/`) are resolved against `site`;
///    anything else must parse as an absolute URL
/// 3. Reject schemes other than HTTP and HTTPS
/// 4. Reject URLs without a host
/// 5. Remove the query string
/// 6. Remove the fragment
///
/// The URL parser already lowercases the host and resolves dot segments, so
/// the result is stable under repeated normalization.
///
/// # Arguments
///
/// * `raw` - The link as found on a page or in the run snapshot
/// * `site` - Base URL of the crawled site
///
/// # Returns
///
/// * `Ok(NormalizedUrl)` - Normalized URL
/// * `Err(UrlError)` - The link cannot be used; callers skip it
///
/// # Examples
///
/// ```
/// use reelcrawl::url::normalize_url;
/// use url::Url;
///
/// let site = Url::parse("http://www.imdb.com").unwrap();
/// let url = normalize_url("/title/tt0468569/?ref_=tt_rec_tt#cast", &site).unwrap();
/// assert_eq!(url.as_str(), "http://www.imdb.com/title/tt0468569/");
/// ```
pub fn normalize_url(raw: &str, site: &Url) -> Result<NormalizedUrl, UrlError> {
    let raw = raw.trim();

    // Step 1 & 2: Parse, resolving host-relative paths against the site
    let mut url = if raw.starts_with('/') {
        site.join(raw).map_err(|e| UrlError::Parse(e.to_string()))?
    } else {
        match Url::parse(raw) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => {
                return Err(UrlError::NotHostRelative(raw.to_string()))
            }
            Err(e) => return Err(UrlError::Parse(e.to_string())),
        }
    };

    // Step 3: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 4: A page without a host cannot be fetched
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    // Step 5 & 6: Drop query and fragment
    url.set_query(None);
    url.set_fragment(None);

    Ok(NormalizedUrl::from_url(&url))
}

/// Host-qualifies a discovered link path and normalizes the result
///
/// Related-item links are usually bare paths such as `/title/tt0468569/`;
/// absolute links pass through unchanged apart from normalization.
pub fn qualify_link(site: &Url, link: &str) -> Result<NormalizedUrl, UrlError> {
    normalize_url(link, site)
}
