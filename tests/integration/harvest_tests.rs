//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small marketplace (feed pages and
//! item pages) and run the full two-phase harvest against it end-to-end.

use marketplace_harvester::config::parse_config;
use marketplace_harvester::output::SqliteSink;
use marketplace_harvester::{run_harvest, Config, HarvestError};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration for a custom marketplace hosted on the mock server
fn create_test_config(server_uri: &str, output: &str, workers: usize) -> Config {
    let toml = format!(
        r##"
        [crawler]
        marketplace = "Mock"
        search-term = "vintage watch"
        start-page = 1
        last-page = 5
        workers = {workers}

        [user-agent]
        crawler-name = "TestHarvester"
        crawler-version = "1.0"
        contact-url = "https://example.com/about"
        contact-email = "test@example.com"

        [output]
        {output}

        [[marketplace]]
        name = "Mock"
        feed-url = "{server_uri}/search?q={{query}}&p={{page}}"
        result-count = "#count"
        item-link = ".card"
        description = "#details"
        price = "#price"
        image = "#gallery"
        not-found-title = "Listing removed"
        "##
    );
    parse_config(&toml).expect("test config must be valid")
}

fn json_output(dir: &Path) -> String {
    format!("format = \"json\"\ndirectory = \"{}\"", dir.display())
}

fn feed_page(count: u32, links: &[&str]) -> String {
    let cards: String = links
        .iter()
        .map(|href| format!(r#"<div class="card"><a href="{}">listing</a></div>"#, href))
        .collect();
    format!(
        r#"<html><body><p id="count">{} results</p>{}</body></html>"#,
        count, cards
    )
}

fn item_page(title: &str, price: Option<&str>) -> String {
    let price = price
        .map(|p| format!(r#"<span id="price">{}</span>"#, p))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>{title}</title></head><body>
        {price}
        <div id="gallery"><img src="https://img.example/{title}.jpg"></div>
        <div id="details">Good condition</div>
        </body></html>"#
    )
}

async fn mount_feed(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "vintage watch"))
        .and(query_param("p", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/itm/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Two result pages, then an empty one. Page 2 repeats item 1001.
async fn mount_marketplace(server: &MockServer) {
    mount_feed(
        server,
        "1",
        feed_page(3, &["/itm/1001?hash=a", "/itm/1002?hash=b", "/itm/1003"]),
    )
    .await;
    mount_feed(
        server,
        "2",
        feed_page(2, &["/itm/1004?hash=c", "/itm/1001?hash=d"]),
    )
    .await;
    mount_feed(server, "3", feed_page(0, &[])).await;

    mount_item(server, "1001", item_page("Omega Seamaster", Some("US $1,200.00"))).await;
    mount_item(server, "1002", item_page("Listing removed", None)).await;
    mount_item(server, "1003", item_page("Seiko 5", None)).await;

    // 1004 renders without a price once, then completely
    Mock::given(method("GET"))
        .and(path("/itm/1004"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(item_page("Tudor Black Bay", None)),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
    mount_item(server, "1004", item_page("Tudor Black Bay", Some("US $3,100.00"))).await;
}

#[tokio::test]
async fn test_full_harvest_to_json_files() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &json_output(dir.path()), 3);

    let report = run_harvest(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.discovered, 5);
    assert_eq!(report.duplicates_dropped, 1);
    assert_eq!(report.dispatch.saved, 2);
    assert_eq!(report.dispatch.recovered, 1);
    assert_eq!(report.dispatch.absent, 1);
    assert_eq!(report.dispatch.unprocessed.len(), 1);
    assert_eq!(
        report.dispatch.unprocessed[0].url,
        format!("{}/itm/1003", server.uri())
    );

    let saved: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("Mock_1001.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(saved["title"], "Omega Seamaster");
    assert_eq!(saved["price"], "US $1,200.00");
    assert_eq!(saved["description"], "Good condition");
    assert_eq!(saved["image path"], "https://img.example/Omega Seamaster.jpg");

    assert!(dir.path().join("Mock_1004.json").exists());
    assert!(!dir.path().join("Mock_1002.json").exists());
    assert!(!dir.path().join("Mock_1003.json").exists());
}

#[tokio::test]
async fn test_feed_pages_fetched_in_order_and_stop_at_empty_page() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &json_output(dir.path()), 1);

    run_harvest(&config, CancellationToken::new()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let feed_pages: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/search")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "p")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(feed_pages, vec!["1", "2", "3"]);

    let last_feed = requests.iter().rposition(|r| r.url.path() == "/search").unwrap();
    let first_item = requests.iter().position(|r| r.url.path().starts_with("/itm/")).unwrap();
    assert!(last_feed < first_item);
}

#[tokio::test]
async fn test_full_harvest_to_sqlite() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("items.db");
    let output = format!("format = \"sqlite\"\ndatabase-path = \"{}\"", db_path.display());
    let config = create_test_config(&server.uri(), &output, 4);

    let report = run_harvest(&config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.dispatch.saved, 2);

    let sink = SqliteSink::new(&db_path, "Mock").unwrap();
    assert_eq!(sink.count().unwrap(), 2);
    let fields = sink.load("1004").unwrap().unwrap();
    assert_eq!(fields.price, "US $3,100.00");
    assert!(sink.load("1002").unwrap().is_none());
}

#[tokio::test]
async fn test_unreadable_feed_page_aborts_harvest() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "1",
        "<html><body><h1>Temporarily unavailable</h1></body></html>".to_string(),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &json_output(dir.path()), 2);

    let result = run_harvest(&config, CancellationToken::new()).await;

    assert!(matches!(result, Err(HarvestError::Extract { .. })));
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_duplicates_in_different_workers_overwrite_json_record() {
    let server = MockServer::start().await;
    mount_marketplace(&server).await;
    let dir = TempDir::new().unwrap();
    // With 3 workers the two copies of item 1001 (indices 0 and 4) go to workers 0 and 1
    let mut config = create_test_config(&server.uri(), &json_output(dir.path()), 3);
    config.crawler.dedupe = false;

    let report = run_harvest(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.duplicates_dropped, 0);
    assert_eq!(report.dispatched(), 5);
    assert_eq!(report.dispatch.saved, 3);
    assert!(report.dispatch.unprocessed.iter().all(|u| u.class != "sink"));
    assert_eq!(report.dispatch.unprocessed.len(), 1);

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Mock_1001.json", "Mock_1004.json"]);
}
