use crate::ConfigError;
use serde::Deserialize;
use url::Url;

/// Main configuration structure for Reelcrawl
///
/// Every section is optional; an empty file yields the built-in defaults,
/// which crawl IMDb's related-title links from a single seed page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// What the crawl loop does when a page cannot be fetched or parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorPolicy {
    /// Report the failure, optionally retry, and continue with the next URL
    #[default]
    Skip,
    /// Stop the run; the snapshot is still written before exiting
    Abort,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Base URL that host-relative links are resolved against
    pub site: String,

    /// Page to start from when there is no snapshot to resume
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Number of records inserted before a run stops
    #[serde(rename = "max-inserts")]
    pub max_inserts: u32,

    #[serde(rename = "on-fetch-error")]
    pub on_fetch_error: FetchErrorPolicy,

    /// Extra attempts for a failed page under the skip policy
    #[serde(rename = "fetch-retries")]
    pub fetch_retries: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Additional host patterns treated as part of the site
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,
}

impl CrawlerConfig {
    /// Parses the configured site base URL
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site '{}': {}", self.site, e)))
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            site: "http://www.imdb.com".to_string(),
            seed_url: "http://www.imdb.com/title/tt0979435".to_string(),
            max_inserts: 100,
            on_fetch_error: FetchErrorPolicy::Skip,
            fetch_retries: 0,
            request_timeout_secs: 30,
            allowed_domains: Vec::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "reelcrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesized part omitted when no contact details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Which durable sink holds the extracted records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Headerless CSV file: url, title, releaseYear, runningTime
    #[default]
    Csv,
    /// SQLite database with a `films` table
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub sink: SinkKind,

    /// Path to the CSV file or SQLite database
    #[serde(rename = "sink-path")]
    pub sink_path: String,

    /// Path to the JSON frontier snapshot
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Csv,
            sink_path: "movie_output.csv".to_string(),
            snapshot_path: "last_run_links.json".to_string(),
        }
    }
}

/// CSS selectors used to pull a record and related links out of a page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container holding the title block; pages without it yield no record
    pub record: String,

    /// Title heading, relative to the record container
    pub title: String,

    /// Release year, relative to the record container
    pub year: String,

    /// Running time, relative to the record container
    #[serde(rename = "running-time")]
    pub running_time: String,

    /// Related-item blocks; the first anchor of each is followed
    #[serde(rename = "related-item")]
    pub related_item: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            record: ".title_wrapper".to_string(),
            title: "h1".to_string(),
            year: "#titleYear".to_string(),
            running_time: ".subtext time".to_string(),
            related_item: ".rec_item".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_reference_constants() {
        let config = Config::default();
        assert_eq!(config.crawler.max_inserts, 100);
        assert_eq!(config.crawler.seed_url, "http://www.imdb.com/title/tt0979435");
        assert_eq!(config.output.sink_path, "movie_output.csv");
        assert_eq!(config.output.snapshot_path, "last_run_links.json");
        assert_eq!(config.crawler.on_fetch_error, FetchErrorPolicy::Skip);
    }

    #[test]
    fn test_user_agent_without_contact() {
        let ua = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
            contact_email: None,
        };
        assert_eq!(ua.header_value(), "TestBot/1.0");
    }

    #[test]
    fn test_user_agent_with_contact() {
        let ua = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: Some("https://example.com/bot".to_string()),
            contact_email: Some("bot@example.com".to_string()),
        };
        assert_eq!(
            ua.header_value(),
            "TestBot/1.0 (+https://example.com/bot; bot@example.com)"
        );
    }

    #[test]
    fn test_site_url_parses() {
        let config = CrawlerConfig::default();
        assert_eq!(config.site_url().unwrap().host_str(), Some("www.imdb.com"));
    }

    #[test]
    fn test_bad_site_url_is_config_error() {
        let config = CrawlerConfig {
            site: "not a site".to_string(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(
            config.site_url().unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }
}
