//! HTML extraction for title pages
//!
//! This module pulls two things out of a fetched page:
//! - The record: title, release year and running time from the title block
//! - Related links: the first anchor of every related-item block
//!
//! Link values are returned exactly as they appear in the markup; the crawl
//! loop qualifies and normalizes them.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Fields extracted from a page's record container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDetails {
    /// Title with the trailing year removed
    pub title: String,

    /// Year text as shown on the page, e.g. `(2008)`
    pub release_year: String,

    pub running_time: String,
}

/// Everything a single page contributes to the crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// `None` when the page has no record container
    pub record: Option<PageDetails>,

    /// Related-item link targets, in page order
    pub links: Vec<String>,
}

/// Compiled selectors used by [`extract_page`]
#[derive(Debug, Clone)]
pub struct ExtractRules {
    record: Selector,
    title: Selector,
    year: Selector,
    running_time: Selector,
    related_item: Selector,
    anchor: Selector,
}

impl ExtractRules {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractRules)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            record: compile(&config.record)?,
            title: compile(&config.title)?,
            year: compile(&config.year)?,
            running_time: compile(&config.running_time)?,
            related_item: compile(&config.related_item)?,
            anchor: compile("a")?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Extracts the record and related links from an HTML document
///
/// # Extraction Rules
///
/// - The record comes from the first element matching the record selector;
///   without one the page yields no record, but its links are still returned
/// - Title, year and running time are looked up inside that element and
///   whitespace-trimmed; a missing field becomes an empty string
/// - The year text is removed from the end of the title heading
/// - Each related-item block contributes the `href` of its first anchor;
///   blocks without an anchor, or whose first anchor has no `href`, are skipped
///
/// # Example
///
/// ```
/// use reelcrawl::config::SelectorConfig;
/// use reelcrawl::crawler::{extract_page, ExtractRules};
///
/// let html = r#"
///     <div class="title_wrapper"><h1>Heat <span id="titleYear">(1995)</span></h1></div>
///     <div class="rec_item"><a href="/title/tt0113277/">Heat</a></div>
/// "#;
/// let rules = ExtractRules::from_config(&SelectorConfig::default()).unwrap();
/// let page = extract_page(html, &rules);
/// assert_eq!(page.record.unwrap().title, "Heat");
/// assert_eq!(page.links, vec!["/title/tt0113277/"]);
/// ```
pub fn extract_page(html: &str, rules: &ExtractRules) -> ExtractedPage {
    let document = Html::parse_document(html);

    let record = document
        .select(&rules.record)
        .next()
        .map(|container| extract_details(container, rules));

    let links = document
        .select(&rules.related_item)
        .filter_map(|item| item.select(&rules.anchor).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect();

    ExtractedPage { record, links }
}

fn extract_details(container: ElementRef<'_>, rules: &ExtractRules) -> PageDetails {
    let heading = text_of(container, &rules.title);
    let release_year = text_of(container, &rules.year);
    let running_time = text_of(container, &rules.running_time);

    let title = heading
        .strip_suffix(release_year.as_str())
        .unwrap_or(&heading)
        .trim()
        .to_string();

    PageDetails {
        title,
        release_year,
        running_time,
    }
}

/// Trimmed text of the first descendant matching `selector`
fn text_of(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|found| found.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
