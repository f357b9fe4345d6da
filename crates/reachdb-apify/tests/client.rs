//! Integration tests for `ApifyClient` using wiremock HTTP mocks.

use reachdb_apify::{ApifyClient, ApifyError, ContactScraperInput, ProfileScraperInput, StartUrl};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ApifyClient {
    ApifyClient::with_base_url("test-token", 30, base_url)
        .expect("client construction should not fail")
        .with_retry_policy(0, 0)
}

#[tokio::test]
async fn start_actor_run_posts_input_and_parses_run() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": {
            "id": "run-abc123",
            "actId": "apify~instagram-profile-scraper",
            "status": "READY",
            "startedAt": "2025-07-10T12:00:00.000Z",
            "defaultDatasetId": "ds-xyz"
        }
    });

    Mock::given(method("POST"))
        .and(path("/acts/apify~instagram-profile-scraper/runs"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "usernames": ["glowwithmaya"],
            "resultsLimit": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let input = ProfileScraperInput {
        usernames: vec!["glowwithmaya".to_owned()],
        results_limit: 1,
    };
    let run = client
        .start_actor_run("apify~instagram-profile-scraper", &input)
        .await
        .expect("should parse run");

    assert_eq!(run.id, "run-abc123");
    assert_eq!(run.status, "READY");
    assert_eq!(run.default_dataset_id.as_deref(), Some("ds-xyz"));
    assert!(run.started_at.is_some());
    assert!(run.finished_at.is_none());
}

#[tokio::test]
async fn get_run_returns_metadata_snapshot() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": {
            "id": "run-abc123",
            "status": "SUCCEEDED",
            "statusMessage": "Finished",
            "startedAt": "2025-07-10T12:00:00.000Z",
            "finishedAt": "2025-07-10T12:01:30.000Z",
            "defaultDatasetId": "ds-xyz"
        }
    });

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-abc123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let run = client.get_run("run-abc123").await.expect("should parse run");

    assert_eq!(run.status, "SUCCEEDED");
    assert_eq!(run.status_message.as_deref(), Some("Finished"));
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn get_run_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": {"message": "Run not found"}})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.get_run("run-nope").await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got: {err}");
}

#[tokio::test]
async fn get_dataset_items_returns_raw_values() {
    let server = MockServer::start().await;

    let items = serde_json::json!([
        {
            "username": "glowwithmaya",
            "fullName": "Maya Ortiz",
            "followersCount": 120_000
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/datasets/ds-xyz/items"))
        .and(query_param("format", "json"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&items))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let items = client
        .get_dataset_items("ds-xyz")
        .await
        .expect("should parse items");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], "glowwithmaya");
    assert_eq!(items[0]["followersCount"], 120_000);
}

#[tokio::test]
async fn run_actor_sync_items_posts_and_returns_items() {
    let server = MockServer::start().await;

    let items = serde_json::json!([
        { "emails": ["maya@glow.example"] }
    ]);

    Mock::given(method("POST"))
        .and(path(
            "/acts/vdrmota~contact-info-scraper/run-sync-get-dataset-items",
        ))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "startUrls": [{"url": "https://instagram.com/glowwithmaya"}],
            "maxRequestsPerStartUrl": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&items))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let input = ContactScraperInput {
        start_urls: vec![StartUrl {
            url: "https://instagram.com/glowwithmaya".to_owned(),
        }],
        max_requests_per_start_url: 1,
    };
    let items = client
        .run_actor_sync_items("vdrmota~contact-info-scraper", &input)
        .await
        .expect("should parse items");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["emails"][0], "maya@glow.example");
}

#[tokio::test]
async fn api_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/acts/apify~instagram-profile-scraper/runs"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"error": {"message": "Invalid token"}})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let input = ProfileScraperInput {
        usernames: vec!["glowwithmaya".to_owned()],
        results_limit: 1,
    };
    let err = client
        .start_actor_run("apify~instagram-profile-scraper", &input)
        .await
        .unwrap_err();

    match err {
        ApifyError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid token"));
        }
        other => panic!("expected API error, got: {other}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.get_run("run-abc123").await.unwrap_err();

    assert!(
        matches!(err, ApifyError::Deserialize { .. }),
        "expected deserialize error, got: {err}"
    );
}

#[tokio::test]
async fn get_run_retries_transient_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let body = serde_json::json!({
        "data": { "id": "run-flaky", "status": "RUNNING" }
    });
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = ApifyClient::with_base_url("test-token", 30, &server.uri())
        .expect("client construction should not fail")
        .with_retry_policy(2, 1);
    let run = client
        .get_run("run-flaky")
        .await
        .expect("should succeed after retry");

    assert_eq!(run.status, "RUNNING");
}
