//! Page fetching
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests for title pages
//! - Error classification into `FetchError`
//!
//! The crawl loop only sees the `PageSource` trait, so tests can drive it
//! with an in-memory site.

use crate::config::Config;
use crate::crawler::parser::{extract_page, ExtractRules, ExtractedPage};
use crate::url::NormalizedUrl;
use crate::ReelError;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Longest time spent establishing a connection
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Most redirects followed for one page
const MAX_REDIRECTS: usize = 10;

/// Reasons a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Expected HTML, got {content_type}")]
    ContentMismatch { content_type: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Source of extracted pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches a page and extracts its record and related links
    async fn fetch_page(&self, url: &NormalizedUrl) -> Result<ExtractedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use reelcrawl::config::Config;
/// use reelcrawl::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.crawler.request_timeout_secs;

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(timeout))
        .connect_timeout(Duration::from_secs(timeout.min(CONNECT_TIMEOUT_SECS)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP and extracts them with the configured selectors
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    rules: ExtractRules,
}

impl HttpPageSource {
    pub fn new(client: Client, rules: ExtractRules) -> Self {
        Self { client, rules }
    }

    /// Builds the client and extraction rules from configuration
    pub fn from_config(config: &Config) -> Result<Self, ReelError> {
        let client = build_http_client(config)?;
        let rules = ExtractRules::from_config(&config.selectors)?;
        Ok(Self::new(client, rules))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    /// # Request Flow
    ///
    /// 1. GET the page, following redirects
    /// 2. Non-2xx status → `FetchError::Status`
    /// 3. A declared Content-Type other than HTML → `FetchError::ContentMismatch`
    /// 4. Read the body and run extraction
    ///
    /// A response without a Content-Type header is treated as HTML.
    async fn fetch_page(&self, url: &NormalizedUrl) -> Result<ExtractedPage, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("text/html") {
                return Err(FetchError::ContentMismatch {
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response.text().await?;
        Ok(extract_page(&body, &self.rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::url::normalize_url;
    use url::Url;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <div class="title_wrapper"><h1>Heat <span id="titleYear">(1995)</span></h1></div>
        <div class="rec_item"><a href="/title/tt0113277/">Heat</a></div>
    "#;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.user_agent.crawler_name = "TestCrawler".to_string();
        config.user_agent.crawler_version = "1.0".to_string();
        config.crawler.request_timeout_secs = 5;
        config
    }

    fn source() -> HttpPageSource {
        HttpPageSource::from_config(&create_test_config()).unwrap()
    }

    fn page_url(server: &MockServer, page: &str) -> NormalizedUrl {
        let site = Url::parse(&server.uri()).unwrap();
        normalize_url(page, &site).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_selector_fails_construction() {
        let mut config = create_test_config();
        config.selectors = SelectorConfig {
            title: "h1[".to_string(),
            ..SelectorConfig::default()
        };
        assert!(matches!(
            HttpPageSource::from_config(&config).unwrap_err(),
            ReelError::Config(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_extracts_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt1/"))
            .and(header_matcher("user-agent", "TestCrawler/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html; charset=utf-8"))
            .mount(&server)
            .await;

        let page = source()
            .fetch_page(&page_url(&server, "/title/tt1/"))
            .await
            .unwrap();

        assert_eq!(page.record.unwrap().title, "Heat");
        assert_eq!(page.links, vec!["/title/tt0113277/".to_string()]);
    }

    #[tokio::test]
    async fn test_not_found_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source()
            .fetch_page(&page_url(&server, "/title/missing/"))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Status { status: 404 });
    }

    #[tokio::test]
    async fn test_non_html_is_content_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .mount(&server)
            .await;

        let err = source()
            .fetch_page(&page_url(&server, "/api"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ContentMismatch { .. }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(PAGE, "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = create_test_config();
        config.crawler.request_timeout_secs = 1;
        let source = HttpPageSource::from_config(&config).unwrap();

        let err = source
            .fetch_page(&page_url(&server, "/title/slow/"))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Reserve a free port, then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let site = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();
        let url = normalize_url("/title/tt1/", &site).unwrap();

        let err = source().fetch_page(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
