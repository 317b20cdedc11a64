//! Integration tests for the review feed client against a wiremock server.

use appvox_core::AppConfig;
use appvox_scraper::{ReviewFeedClient, ScraperError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_owned(),
        bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
        log_level: "info".to_owned(),
        default_country: "us".to_owned(),
        default_review_limit: 100,
        db_max_connections: 10,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        feed_request_timeout_secs: 5,
        feed_user_agent: "appvox-test/0.1".to_owned(),
        feed_max_retries: 2,
        feed_retry_backoff_base_ms: 0,
        classifier_max_chars: 512,
        classifier_timeout_ms: 5_000,
        classifier_max_concurrency: 8,
        keyword_top_n: 10,
        embeddings_url: None,
    }
}

fn review_entry(rating: &str, title: &str, content: &str) -> Value {
    json!({
        "im:rating": { "label": rating },
        "title": { "label": title },
        "content": { "label": content, "attributes": { "type": "text" } },
        "updated": { "label": "2024-05-01T08:30:00-07:00" }
    })
}

fn feed_page(entries: Vec<Value>) -> Value {
    json!({ "feed": { "entry": entries } })
}

fn page_path(app_id: &str, page: u32) -> String {
    format!("/us/rss/customerreviews/page={page}/id={app_id}/sortby=mostrecent/json")
}

async fn mount_page(server: &MockServer, app_id: &str, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path(page_path(app_id, page)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> ReviewFeedClient {
    ReviewFeedClient::with_base_url(&test_config(), &server.uri())
        .expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_returns_mapped_reviews() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "123",
        1,
        feed_page(vec![
            review_entry("5", "Great", "Love this app"),
            review_entry("1", "Bad", "Crashes constantly"),
        ]),
    )
    .await;
    mount_page(&server, "123", 2, json!({ "feed": {} })).await;

    let reviews = client_for(&server)
        .fetch("123", "us", 10)
        .await
        .expect("fetch should succeed");

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].rating, 5);
    assert_eq!(reviews[0].title, "Great");
    assert_eq!(reviews[1].review, "Crashes constantly");
    assert!(reviews[0].date.is_some());
}

#[tokio::test]
async fn fetch_paginates_until_count_is_met() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "456",
        1,
        feed_page(vec![
            review_entry("4", "a", "first page one"),
            review_entry("3", "b", "first page two"),
        ]),
    )
    .await;
    mount_page(
        &server,
        "456",
        2,
        feed_page(vec![review_entry("2", "c", "second page one")]),
    )
    .await;

    let reviews = client_for(&server)
        .fetch("456", "us", 3)
        .await
        .expect("fetch should succeed");

    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[2].review, "second page one");
}

#[tokio::test]
async fn fetch_truncates_to_requested_count() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "789",
        1,
        feed_page(vec![
            review_entry("5", "a", "one"),
            review_entry("4", "b", "two"),
            review_entry("3", "c", "three"),
        ]),
    )
    .await;

    let reviews = client_for(&server)
        .fetch("789", "us", 2)
        .await
        .expect("fetch should succeed");

    assert_eq!(reviews.len(), 2);
}

#[tokio::test]
async fn fewer_reviews_than_requested_is_not_an_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "321",
        1,
        feed_page(vec![review_entry("5", "only", "the only one")]),
    )
    .await;
    mount_page(&server, "321", 2, json!({ "feed": {} })).await;

    let reviews = client_for(&server)
        .fetch("321", "us", 50)
        .await
        .expect("fetch should succeed");

    assert_eq!(reviews.len(), 1);
}

#[tokio::test]
async fn metadata_entries_are_filtered_out() {
    let server = MockServer::start().await;
    let app_summary = json!({ "title": { "label": "Some App" } });
    mount_page(
        &server,
        "654",
        1,
        feed_page(vec![app_summary, review_entry("5", "t", "real review")]),
    )
    .await;
    mount_page(&server, "654", 2, json!({ "feed": {} })).await;

    let reviews = client_for(&server)
        .fetch("654", "us", 10)
        .await
        .expect("fetch should succeed");

    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review, "real review");
}

#[tokio::test]
async fn invalid_app_id_fails_before_any_request() {
    let server = MockServer::start().await;

    let result = client_for(&server).fetch("not-an-id", "us", 10).await;

    assert!(matches!(result, Err(ScraperError::InvalidAppId { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path("111", 1)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "111",
        1,
        feed_page(vec![review_entry("3", "ok", "works after retry")]),
    )
    .await;
    mount_page(&server, "111", 2, json!({ "feed": {} })).await;

    let reviews = client_for(&server)
        .fetch("111", "us", 10)
        .await
        .expect("fetch should succeed after retry");

    assert_eq!(reviews.len(), 1);
}

#[tokio::test]
async fn malformed_feed_json_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path("222", 1)))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch("222", "us", 10).await;

    assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
}
