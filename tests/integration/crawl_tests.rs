//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small title site and run the full
//! crawl cycle end-to-end: snapshot in, pages over HTTP, records and
//! snapshot out.

use reelcrawl::config::{Config, FetchErrorPolicy, SinkKind};
use reelcrawl::crawler::{run_crawl, Termination};
use reelcrawl::state::RunSnapshot;
use reelcrawl::storage::{open_sink, RecordSink};
use reelcrawl::ReelError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renders a title page with a record block and related items
fn title_page(title: &str, year: &str, links: &[&str]) -> String {
    let related: String = links
        .iter()
        .map(|link| {
            format!(
                r#"<div class="rec_item"><a href="{}?ref_=tt_rec_tt"><img alt="poster"></a></div>"#,
                link
            )
        })
        .collect();

    format!(
        r#"<html><head><title>{title} - IMDb</title></head><body>
        <div class="title_wrapper">
            <h1>{title}&nbsp;<span id="titleYear">({year})</span></h1>
            <div class="subtext"><time datetime="PT120M">2h</time></div>
        </div>
        <div class="rec_overview">{related}</div>
        </body></html>"#,
        title = title,
        year = year,
        related = related
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// Seed links to tt1 and tt2; tt1 links on to tt3; tt2 and tt3 link back
async fn mount_small_site(server: &MockServer) {
    mount_page(
        server,
        "/title/tt0/",
        title_page("Seed Film", "2008", &["/title/tt1/", "/title/tt2/"]),
    )
    .await;
    mount_page(
        server,
        "/title/tt1/",
        title_page("First Film", "2001", &["/title/tt3/", "/title/tt0/"]),
    )
    .await;
    mount_page(
        server,
        "/title/tt2/",
        title_page("Second Film", "2002", &["/title/tt0/"]),
    )
    .await;
    mount_page(
        server,
        "/title/tt3/",
        title_page("Third Film", "2003", &["/title/tt1/"]),
    )
    .await;
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir, max_inserts: u32) -> Config {
    let mut config = Config::default();
    config.crawler.site = server.uri();
    config.crawler.seed_url = "/title/tt0/".to_string();
    config.crawler.max_inserts = max_inserts;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config.output.sink_path = dir
        .path()
        .join("movie_output.csv")
        .to_string_lossy()
        .to_string();
    config.output.snapshot_path = dir
        .path()
        .join("last_run_links.json")
        .to_string_lossy()
        .to_string();
    config
}

fn page(server: &MockServer, page_path: &str) -> String {
    format!("{}{}", server.uri(), page_path)
}

fn read_snapshot(config: &Config) -> Vec<String> {
    RunSnapshot::load(Path::new(&config.output.snapshot_path))
        .unwrap()
        .links
}

fn read_sink(config: &Config) -> Vec<String> {
    open_sink(&config.output).unwrap().load_urls().unwrap()
}

#[tokio::test]
async fn test_cap_one_writes_record_and_snapshot() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 1);

    let report = run_crawl(config.clone(), false).await.unwrap();

    assert_eq!(report.termination, Termination::CapReached);
    assert_eq!(report.inserted, 1);

    let csv = std::fs::read_to_string(&config.output.sink_path).unwrap();
    assert_eq!(
        csv,
        format!("{},Seed Film,(2008),2h\n", page(&server, "/title/tt0/"))
    );

    assert_eq!(
        read_snapshot(&config),
        vec![page(&server, "/title/tt1/"), page(&server, "/title/tt2/")]
    );
}

#[tokio::test]
async fn test_two_capped_runs_match_one_longer_run() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let resumed_dir = TempDir::new().unwrap();
    let resumed = create_test_config(&server, &resumed_dir, 1);
    run_crawl(resumed.clone(), false).await.unwrap();
    run_crawl(resumed.clone(), false).await.unwrap();

    let single_dir = TempDir::new().unwrap();
    let single = create_test_config(&server, &single_dir, 2);
    run_crawl(single.clone(), false).await.unwrap();

    assert_eq!(read_sink(&resumed), read_sink(&single));
    assert_eq!(read_snapshot(&resumed), read_snapshot(&single));
    assert_eq!(
        read_sink(&resumed),
        vec![page(&server, "/title/tt0/"), page(&server, "/title/tt1/")]
    );
}

#[tokio::test]
async fn test_drains_site_without_duplicates() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 100);

    let report = run_crawl(config.clone(), false).await.unwrap();

    assert_eq!(report.termination, Termination::Drained);
    assert_eq!(report.inserted, 4);
    assert!(read_snapshot(&config).is_empty());

    let mut urls = read_sink(&config);
    let total = urls.len();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), total);

    // The next run starts from the seed again, finds it stored, and stops
    let again = run_crawl(config.clone(), false).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(read_sink(&config).len(), 4);
}

#[tokio::test]
async fn test_sqlite_sink() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir, 3);
    config.output.sink = SinkKind::Sqlite;
    config.output.sink_path = dir.path().join("films.db").to_string_lossy().to_string();

    run_crawl(config.clone(), false).await.unwrap();

    let sink = open_sink(&config.output).unwrap();
    assert_eq!(sink.count().unwrap(), 3);
    let latest = sink.latest().unwrap().unwrap();
    assert_eq!(latest.title, "Second Film");
    assert_eq!(latest.release_year, "(2002)");
    assert!(latest.created_at.is_some());
}

#[tokio::test]
async fn test_missing_page_skipped_by_default() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/title/tt0/",
        title_page("Seed Film", "2008", &["/title/gone/", "/title/tt2/"]),
    )
    .await;
    mount_page(&server, "/title/tt2/", title_page("Second Film", "2002", &[])).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 10);

    let report = run_crawl(config.clone(), false).await.unwrap();

    assert_eq!(report.termination, Termination::Drained);
    assert_eq!(report.failed_fetches, 1);
    assert_eq!(
        read_sink(&config),
        vec![page(&server, "/title/tt0/"), page(&server, "/title/tt2/")]
    );
}

#[tokio::test]
async fn test_abort_policy_saves_snapshot_then_fails() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/title/tt0/",
        title_page("Seed Film", "2008", &["/title/gone/", "/title/tt2/"]),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir, 10);
    config.crawler.on_fetch_error = FetchErrorPolicy::Abort;

    let err = run_crawl(config.clone(), false).await.unwrap_err();

    match err {
        ReelError::Fetch { url, .. } => assert_eq!(url, page(&server, "/title/gone/")),
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert_eq!(read_sink(&config), vec![page(&server, "/title/tt0/")]);
    assert_eq!(
        read_snapshot(&config),
        vec![page(&server, "/title/gone/"), page(&server, "/title/tt2/")]
    );
}

#[tokio::test]
async fn test_fresh_ignores_saved_frontier() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 1);
    RunSnapshot::new(vec![page(&server, "/title/tt3/")])
        .save(Path::new(&config.output.snapshot_path))
        .unwrap();

    run_crawl(config.clone(), true).await.unwrap();

    assert_eq!(read_sink(&config), vec![page(&server, "/title/tt0/")]);
}

#[tokio::test]
async fn test_invalid_snapshot_entry_never_saved() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 1);
    RunSnapshot::new(vec![
        "::not a url::".to_string(),
        page(&server, "/title/tt2/"),
    ])
    .save(Path::new(&config.output.snapshot_path))
    .unwrap();

    let report = run_crawl(config.clone(), false).await.unwrap();

    assert_eq!(report.rejected_links, 1);
    assert_eq!(read_sink(&config), vec![page(&server, "/title/tt2/")]);
    assert!(read_snapshot(&config)
        .iter()
        .all(|link| !link.contains("not a url")));
}

#[tokio::test]
async fn test_corrupt_snapshot_is_fatal() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 1);
    std::fs::write(&config.output.snapshot_path, "{\"links\": [").unwrap();

    let err = run_crawl(config.clone(), false).await.unwrap_err();

    assert!(matches!(err, ReelError::Snapshot(_)));
    assert!(!Path::new(&config.output.sink_path).exists());
}
