//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the catalog API and test the
//! full count, page, fetch, merge and persist cycle end-to-end.

use igdb_scrape::auth::{ClientCredentials, Credentials};
use igdb_scrape::client::{build_http_client, CatalogClient};
use igdb_scrape::config::Config;
use igdb_scrape::scrape::{scrape, Coordinator, Executor, Gate, RetryPolicy, ScrapeSettings};
use igdb_scrape::{Playlist, Query, ScrapeError, Sort};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a playlist over the given filter, sorted by id
fn playlist(title: &str, filter: &str) -> Playlist {
    let query = Query::builder()
        .fields(["name", "url"])
        .where_clause(filter)
        .sort(Sort::asc("id"))
        .build()
        .expect("valid test query");
    Playlist::new(title, query)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Creates a coordinator talking to the mock server
fn coordinator(server: &MockServer, outdir: &Path) -> Coordinator {
    coordinator_with(server, outdir, Gate::new(8, 1000.0).unwrap(), 500, 20)
}

/// Creates a coordinator with its own gate and paging settings
fn coordinator_with(
    server: &MockServer,
    outdir: &Path,
    gate: Gate,
    page_size: usize,
    batch_size: usize,
) -> Coordinator {
    let http = build_http_client(Duration::from_secs(5)).expect("http client");
    let client = CatalogClient::new(http, &server.uri(), Credentials::new("id", "token"))
        .expect("catalog client");
    let executor = Executor::new(client, Arc::new(gate), fast_policy());

    Coordinator::new(
        Arc::new(executor),
        ScrapeSettings {
            outdir: outdir.to_path_buf(),
            page_size,
            batch_size,
        },
    )
}

fn json_body(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(value)
}

/// Builds a multiquery answer with one sub-result per `(label, games)`
fn multiquery_answer(parts: Vec<(String, Vec<Value>)>) -> Value {
    Value::Array(
        parts
            .into_iter()
            .map(|(label, games)| json!({"name": label, "result": games}))
            .collect(),
    )
}

fn read_artifact(path: &Path) -> Vec<Value> {
    let text = std::fs::read_to_string(path).expect("artifact exists");
    serde_json::from_str(&text).expect("artifact is JSON")
}

#[tokio::test]
async fn test_full_scrape_single_playlist() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(header("Client-ID", "id"))
        .and(header("Authorization", "Bearer token"))
        .and(body_string_contains("where platforms = (1);"))
        .respond_with(json_body(json!({"count": 1200})))
        .expect(1)
        .mount(&server)
        .await;

    // Names run backwards against ids so the artifact order must come from
    // the name sort, not from the paging order
    let games: Vec<Value> = (0..1200)
        .map(|id| json!({"id": id, "name": format!("Game {:04}", 1199 - id)}))
        .collect();
    let answer = multiquery_answer(vec![
        ("Sega - Saturn (0-499)".to_string(), games[0..500].to_vec()),
        ("Sega - Saturn (500-999)".to_string(), games[500..1000].to_vec()),
        ("Sega - Saturn (1000-1199)".to_string(), games[1000..1200].to_vec()),
    ]);

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .and(body_string_contains(r#"query games "Sega - Saturn (0-499)""#))
        .and(body_string_contains("limit 200; offset 1000;"))
        .respond_with(json_body(answer))
        .expect(1)
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![playlist("Sega - Saturn", "platforms = (1)")])
        .await;

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert_eq!(report.dispatches, 2);

    let artifact = report.outcome("Sega - Saturn").unwrap().result.as_ref().unwrap();
    assert_eq!(artifact.count, 1200);
    assert_eq!(artifact.batches, 1);

    let written = read_artifact(&outdir.path().join("Sega - Saturn.json"));
    assert_eq!(written.len(), 1200);

    let names: Vec<&str> = written.iter().map(|g| g["name"].as_str().unwrap()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let mut ids: Vec<u64> = written.iter().map(|g| g["id"].as_u64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1200);
}

#[tokio::test]
async fn test_invalid_count_fails_only_that_playlist() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (2)"))
        .respond_with(json_body(json!({"count": "not-a-number"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (1)"))
        .respond_with(json_body(json!({"count": 2})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .and(body_string_contains(r#""Good (0-1)""#))
        .respond_with(json_body(multiquery_answer(vec![(
            "Good (0-1)".to_string(),
            vec![json!({"id": 2, "name": "Zork"}), json!({"id": 1, "name": "Adventure"})],
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![
            playlist("Bad", "platforms = (2)"),
            playlist("Good", "platforms = (1)"),
        ])
        .await;

    assert!(!report.is_success());

    let bad = report.outcome("Bad").unwrap();
    assert!(matches!(
        bad.result,
        Err(ScrapeError::InvalidCountResponse { ref playlist, .. }) if playlist == "Bad"
    ));
    assert!(!outdir.path().join("Bad.json").exists());

    let good = read_artifact(&outdir.path().join("Good.json"));
    assert_eq!(good, vec![json!({"id": 1, "name": "Adventure"}), json!({"id": 2, "name": "Zork"})]);
}

#[tokio::test]
async fn test_zero_count_writes_empty_artifact() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(json_body(json!({"count": 0})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(json_body(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![playlist("Empty", "platforms = (9)")])
        .await;

    assert!(report.is_success());
    let path = outdir.path().join("Empty.json");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
}

#[tokio::test]
async fn test_failed_batch_writes_nothing() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(json_body(json!({"count": 3})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Syntax Error"))
        .expect(1)
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![playlist("Broken", "platforms = (3)")])
        .await;

    let outcome = report.outcome("Broken").unwrap();
    assert!(matches!(
        outcome.result,
        Err(ScrapeError::RequestFailed { status: 400, ref body }) if body == "Syntax Error"
    ));
    assert!(!outdir.path().join("Broken.json").exists());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(json_body(json!({"count": 1})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(json_body(multiquery_answer(vec![(
            "Retry (0-0)".to_string(),
            vec![json!({"id": 1, "name": "Myst"})],
        )])))
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![playlist("Retry", "platforms = (4)")])
        .await;

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert_eq!(report.dispatches, 5);
    assert_eq!(
        read_artifact(&outdir.path().join("Retry.json")),
        vec![json!({"id": 1, "name": "Myst"})]
    );
}

/// Games `offset..offset + len`, named so that name order reverses id order
fn games(offset: usize, len: usize) -> Vec<Value> {
    (offset..offset + len)
        .map(|id| json!({"id": id, "name": format!("Game {:02}", 99 - id)}))
        .collect()
}

/// Mounts the answer for one two-window batch of `title`, keyed by its first label
async fn mount_batch(server: &MockServer, title: &str, offset: usize, windows: usize) {
    let parts = (0..windows)
        .map(|i| {
            let start = offset + i * 2;
            (format!("{} ({}-{})", title, start, start + 1), games(start, 2))
        })
        .collect();

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .and(body_string_contains(format!(r#""{} ({}-{})""#, title, offset, offset + 1)))
        .respond_with(json_body(multiquery_answer(parts)))
        .expect(1)
        .mount(server)
        .await;
}

fn multiquery_requests(requests: &[wiremock::Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == "/multiquery")
        .count()
}

#[tokio::test]
async fn test_multiple_batches_merge_in_order() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(json_body(json!({"count": 10})))
        .mount(&server)
        .await;

    // 10 games in pages of 2 and batches of 2 windows: 3 multiqueries
    mount_batch(&server, "Multi", 0, 2).await;
    mount_batch(&server, "Multi", 4, 2).await;
    mount_batch(&server, "Multi", 8, 1).await;

    let report = coordinator_with(&server, outdir.path(), Gate::new(8, 1000.0).unwrap(), 2, 2)
        .run(vec![playlist("Multi", "platforms = (6)")])
        .await;

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert_eq!(report.dispatches, 4);

    let artifact = report.outcome("Multi").unwrap().result.as_ref().unwrap();
    assert_eq!(artifact.batches, 3);
    assert_eq!(artifact.count, 10);

    let written = read_artifact(&outdir.path().join("Multi.json"));
    let ids: Vec<u64> = written.iter().map(|g| g["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
}

#[tokio::test]
async fn test_failed_batch_spares_sibling_playlist() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (5)"))
        .respond_with(json_body(json!({"count": 10})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (7)"))
        .respond_with(json_body(json!({"count": 4})))
        .mount(&server)
        .await;

    // The middle batch of "Broken" is rejected; its other batches answer
    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .and(body_string_contains(r#""Broken (4-5)""#))
        .respond_with(ResponseTemplate::new(400).set_body_string("Syntax Error"))
        .mount(&server)
        .await;
    for offset in [0, 8] {
        let windows = if offset == 8 { 1 } else { 2 };
        let parts = (0..windows)
            .map(|i| {
                let start = offset + i * 2;
                (format!("Broken ({}-{})", start, start + 1), games(start, 2))
            })
            .collect();
        Mock::given(method("POST"))
            .and(path("/multiquery"))
            .and(body_string_contains(format!(r#""Broken ({}-{})""#, offset, offset + 1)))
            .respond_with(json_body(multiquery_answer(parts)))
            .mount(&server)
            .await;
    }

    mount_batch(&server, "Fine", 0, 2).await;

    let report = coordinator_with(&server, outdir.path(), Gate::new(8, 1000.0).unwrap(), 2, 2)
        .run(vec![
            playlist("Broken", "platforms = (5)"),
            playlist("Fine", "platforms = (7)"),
        ])
        .await;

    let broken = report.outcome("Broken").unwrap();
    assert!(matches!(
        broken.result,
        Err(ScrapeError::RequestFailed { status: 400, .. })
    ));
    assert!(!outdir.path().join("Broken.json").exists());

    let fine = read_artifact(&outdir.path().join("Fine.json"));
    assert_eq!(fine.len(), 4);
    assert_eq!(report.succeeded().count(), 1);
}

#[tokio::test]
async fn test_failed_batch_cancels_pending_batches() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .respond_with(json_body(json!({"count": 10})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Syntax Error"))
        .mount(&server)
        .await;

    // One request in flight and one per second: the first batch fails while
    // the other two still wait at the gate
    let report = coordinator_with(&server, outdir.path(), Gate::new(1, 1.0).unwrap(), 2, 2)
        .run(vec![playlist("Stopped", "platforms = (8)")])
        .await;

    assert!(!report.is_success());
    assert_eq!(report.dispatches, 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(multiquery_requests(&requests), 1);
    assert!(!outdir.path().join("Stopped.json").exists());
}

#[tokio::test]
async fn test_oversized_count_fails_only_that_playlist() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (2)"))
        .respond_with(json_body(json!({"count": 1e30})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/games/count"))
        .and(body_string_contains("platforms = (1)"))
        .respond_with(json_body(json!({"count": 1})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multiquery"))
        .respond_with(json_body(multiquery_answer(vec![(
            "Good (0-0)".to_string(),
            vec![json!({"id": 1, "name": "Adventure"})],
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let report = coordinator(&server, outdir.path())
        .run(vec![
            playlist("Huge", "platforms = (2)"),
            playlist("Good", "platforms = (1)"),
        ])
        .await;

    assert!(matches!(
        report.outcome("Huge").unwrap().result,
        Err(ScrapeError::InvalidCountResponse { .. })
    ));
    assert!(!outdir.path().join("Huge.json").exists());
    assert_eq!(read_artifact(&outdir.path().join("Good.json")).len(), 1);
}

#[tokio::test]
async fn test_scrape_with_token_exchange() {
    let server = MockServer::start().await;
    let outdir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(query_param("client_id", "my-id"))
        .and(query_param("client_secret", "my-secret"))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(json_body(json!({
            "access_token": "fresh-token",
            "expires_in": 5000000,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/games/count"))
        .and(header("Client-ID", "my-id"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(json_body(json!({"count": 1})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/multiquery"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(json_body(multiquery_answer(vec![(
            "DOS (0-0)".to_string(),
            vec![json!({"id": 7, "name": "Doom"})],
        )])))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.api.base_url = format!("{}/v4", server.uri());
    config.api.token_url = format!("{}/oauth2/token", server.uri());

    let credentials = ClientCredentials {
        client_id: "my-id".to_string(),
        client_secret: "my-secret".to_string(),
    };
    let client = CatalogClient::connect(&config.api, &credentials).await.unwrap();

    let report = scrape(
        &config,
        client,
        vec![playlist("DOS", "platforms = (13)")],
        outdir.path(),
    )
    .await
    .unwrap();

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert_eq!(
        read_artifact(&outdir.path().join("DOS.json")),
        vec![json!({"id": 7, "name": "Doom"})]
    );
}
