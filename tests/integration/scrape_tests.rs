//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers standing in for a
//! forum and an API endpoint, and run the real HTTP fetcher end-to-end.

use board_harvest::config::{parse_config, Config};
use board_harvest::crawler::{HttpFetcher, Orchestrator, PageFetcher, Readiness};
use board_harvest::model::FailureReason;
use board_harvest::output::{ApiForwarder, StoreSink};
use board_harvest::sites::Site;
use board_harvest::storage::{open_storage, PostStore};
use board_harvest::{FetchErrorKind, ScrapeConfig};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST_PAGE: &str = include_str!("../fixtures/clien_post.html");
const BOARD_PATH: &str = "/service/board/park";

const POST_READY: Readiness = Readiness {
    selector: "div.post_view",
    block_markers: &[],
};

/// Config routing the mock server's host to the Clien adapter
fn test_config(api_url: Option<&str>) -> Config {
    let api_line = api_url
        .map(|url| format!("api-url = \"{}\"\n", url))
        .unwrap_or_default();
    let toml = format!(
        r#"
[scrape]
post-limit = 10
delay-between-requests = 0.0
wait-time = 0
timeout = 5000
{api_line}
[[alias]]
domain = "127.0.0.1"
site = "clien"
"#
    );
    parse_config(&toml).expect("test config should parse")
}

fn fast_scrape_config() -> ScrapeConfig {
    ScrapeConfig {
        wait_time: 0,
        timeout: 5_000,
        delay_between_requests: 0.0,
        ..ScrapeConfig::default()
    }
}

fn listing(ids: &[u64]) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="list_item"><a class="list_subject" href="{BOARD_PATH}/{id}">post {id}</a></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div class="list_content">{items}</div></body></html>"#)
}

async fn mount_board(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .and(query_param("po", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[18000001, 18000002])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .and(query_param("po", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/18000001", BOARD_PATH)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(POST_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/18000002", BOARD_PATH)))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn fetch_path(server: &MockServer, page: &str) -> Result<Url, FetchErrorKind> {
    let url = Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
    HttpFetcher::new()
        .fetch(&url, &POST_READY, &fast_scrape_config())
        .await
        .map(|raw| raw.final_url)
        .map_err(|e| e.kind)
}

#[tokio::test]
async fn test_fetcher_maps_statuses() {
    let server = MockServer::start().await;
    for (status, page) in [(404, "/gone"), (403, "/denied"), (429, "/slow-down"), (500, "/broken")] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    assert_eq!(fetch_path(&server, "/gone").await, Err(FetchErrorKind::NotFound));
    assert_eq!(fetch_path(&server, "/denied").await, Err(FetchErrorKind::Blocked));
    assert_eq!(fetch_path(&server, "/slow-down").await, Err(FetchErrorKind::Blocked));
    assert_eq!(fetch_path(&server, "/broken").await, Err(FetchErrorKind::Network));
}

#[tokio::test]
async fn test_fetcher_detects_challenge_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/challenge"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div id="cf-chl-widget">Checking your browser</div></body></html>"#,
        ))
        .mount(&server)
        .await;

    assert_eq!(fetch_path(&server, "/challenge").await, Err(FetchErrorKind::Blocked));
}

#[tokio::test]
async fn test_fetcher_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/service/board/park/5"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/service/board/park/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(POST_PAGE))
        .mount(&server)
        .await;

    let final_url = fetch_path(&server, "/old").await.unwrap();
    assert_eq!(final_url.path(), "/service/board/park/5");
}

#[tokio::test]
async fn test_fetcher_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stuck"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/stuck", server.uri())).unwrap();
    let config = ScrapeConfig {
        timeout: 1_000,
        ..fast_scrape_config()
    };
    let result = HttpFetcher::new().fetch(&url, &POST_READY, &config).await;

    assert_eq!(result.unwrap_err().kind, FetchErrorKind::Timeout);
}

#[tokio::test]
async fn test_board_scrape_end_to_end() {
    let server = MockServer::start().await;
    mount_board(&server).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("harvest.db");
    let config = test_config(None);

    let store = open_storage(&db_path).unwrap();
    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    )
    .with_sink(Box::new(StoreSink::new(Box::new(store))));

    let board_url = format!("{}{}", server.uri(), BOARD_PATH);
    let report = orchestrator.scrape_board(&board_url).await.unwrap();

    assert_eq!(report.len(), 2);
    assert!(!report.cancelled);

    let post = report.results[0].post().expect("first post should succeed");
    assert_eq!(post.site, Site::Clien);
    assert_eq!(post.post_id, "18000001");
    assert_eq!(post.comments.len(), 3);

    let failure = report.results[1].failure().expect("second post should fail");
    assert_eq!(failure.attempts, 1);
    match &failure.reason {
        FailureReason::Fetch(e) => {
            assert_eq!(e.kind, FetchErrorKind::NotFound);
            assert_eq!(e.status, Some(404));
        }
        other => panic!("unexpected failure reason: {:?}", other),
    }

    // A second run over the same board keeps one record per post
    orchestrator.scrape_board(&board_url).await.unwrap();

    let store = open_storage(&db_path).unwrap();
    assert_eq!(store.count_posts(Some(Site::Clien)).unwrap(), 1);
    assert_eq!(store.count_comments().unwrap(), 3);
    let stored = store.get_post(Site::Clien, "18000001").unwrap().unwrap();
    assert_eq!(&stored, post);
}

#[tokio::test]
async fn test_unknown_host_is_rejected() {
    let config = test_config(None);
    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    );

    let result = orchestrator.scrape_post("https://forum.example.org/posts/1").await;
    assert!(matches!(
        result,
        Err(board_harvest::ScrapeError::UnsupportedSite(_))
    ));
}

#[tokio::test]
async fn test_api_forwarder_posts_json() {
    let forum = MockServer::start().await;
    mount_board(&forum).await;

    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_partial_json(serde_json::json!({
            "site": "clien",
            "post": { "post_id": "18000001", "site": "clien" }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&api)
        .await;

    let endpoint = format!("{}/posts", api.uri());
    let config = test_config(Some(&endpoint));
    let forwarder = ApiForwarder::new(
        Url::parse(config.scrape.api_url.as_deref().unwrap()).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();

    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    )
    .with_sink(Box::new(forwarder));

    let post_url = format!("{}{}/18000001", forum.uri(), BOARD_PATH);
    let result = orchestrator.scrape_post(&post_url).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn test_failing_api_does_not_change_results() {
    let forum = MockServer::start().await;
    mount_board(&forum).await;

    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api)
        .await;

    let config = test_config(None);
    let board_url = format!("{}{}", forum.uri(), BOARD_PATH);

    let mut plain = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    );
    let baseline = plain.scrape_board(&board_url).await.unwrap();

    let forwarder =
        ApiForwarder::new(Url::parse(&api.uri()).unwrap(), Duration::from_secs(5)).unwrap();
    let mut forwarding = Orchestrator::new(
        Arc::new(HttpFetcher::new()),
        config.scrape.clone(),
        config.registry(),
    )
    .with_sink(Box::new(forwarder));
    let report = forwarding.scrape_board(&board_url).await.unwrap();

    assert_eq!(report.results, baseline.results);
    assert_eq!(report.success_count(), 1);
}
