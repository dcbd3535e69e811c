//! Source client tests against a mock upstream

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use residency_sync::config::EndpointConfig;
use residency_sync::source::{SourceClient, FIELD_JOB_DESCRIPTION};
use residency_sync::ResidencyType;

const TOKEN: &str = "test-token";

fn client() -> SourceClient {
    SourceClient::new(TOKEN, Duration::from_secs(5), 4, 10).unwrap()
}

fn endpoint(server: &MockServer, residency_type: ResidencyType, list_path: &str) -> EndpointConfig {
    let url = Url::parse(&format!("{}{}", server.uri(), list_path)).unwrap();
    EndpointConfig::new(residency_type, url)
}

fn record(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "fields": { "Name": name, "Job Title": "Engineer" },
        "createdTime": "2024-02-01T09:00:00.000Z"
    })
}

#[tokio::test]
async fn follows_offset_cursor_until_last_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/r1/data"))
        .and(header("cookie", "jwtToken=test-token"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec1", "R1 | Acme")],
            "offset": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r1/data"))
        .and(body_json(json!({ "offset": "page-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec2", "R1 | Globex")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client()
        .fetch_endpoint(&endpoint(&server, ResidencyType::R1, "/r1/data"))
        .await
        .unwrap();

    let ids: Vec<&str> = fetched.records.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "rec2"]);
    assert!(fetched
        .records
        .iter()
        .all(|r| r.residency_type == ResidencyType::R1));
}

#[tokio::test]
async fn failing_endpoint_is_counted_and_others_survive() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/r1/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec1", "R1 | Acme"), record("rec2", "R1 | Globex")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r2/data"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r3/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec3", "R3 | Initech")]
        })))
        .mount(&server)
        .await;

    let endpoints = vec![
        endpoint(&server, ResidencyType::R1, "/r1/data"),
        endpoint(&server, ResidencyType::R2, "/r2/data"),
        endpoint(&server, ResidencyType::R3, "/r3/data"),
    ];

    let outcome = client().fetch_all(&endpoints).await;

    assert_eq!(outcome.endpoints_ok, 2);
    assert_eq!(outcome.endpoints_failed, 1);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.records[2].residency_type, ResidencyType::R3);
}

#[tokio::test]
async fn failing_page_discards_whole_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/r1/data"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec1", "R1 | Acme")],
            "offset": "next"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r1/data"))
        .and(body_json(json!({ "offset": "next" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = client()
        .fetch_all(&[endpoint(&server, ResidencyType::R1, "/r1/data")])
        .await;

    assert_eq!(outcome.endpoints_failed, 1);
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn detail_failure_keeps_record_without_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/r2/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record("rec1", "R2 | Acme"), record("rec2", "R2 | Globex")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r2/detail"))
        .and(body_json(json!({ "recordId": "rec1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "fields": { "Job Description": "Design and build pipelines" } }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/r2/detail"))
        .and(body_json(json!({ "recordId": "rec2" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let detail_url = Url::parse(&format!("{}/r2/detail", server.uri())).unwrap();
    let endpoint = endpoint(&server, ResidencyType::R2, "/r2/data").with_detail(detail_url);

    let fetched = client().fetch_endpoint(&endpoint).await.unwrap();

    assert_eq!(fetched.records.len(), 2);
    assert_eq!(fetched.detail_failures, 1);
    assert_eq!(
        fetched.records[0].record.fields.text(FIELD_JOB_DESCRIPTION).as_deref(),
        Some("Design and build pipelines")
    );
    assert_eq!(fetched.records[1].record.id, "rec2");
    assert!(fetched.records[1].record.fields.text(FIELD_JOB_DESCRIPTION).is_none());
}

#[tokio::test]
async fn endless_pagination_is_cut_off() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/r4/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [],
            "offset": "again"
        })))
        .mount(&server)
        .await;

    let client = SourceClient::new(TOKEN, Duration::from_secs(5), 1, 3).unwrap();
    let result = client
        .fetch_endpoint(&endpoint(&server, ResidencyType::R4, "/r4/data"))
        .await;

    assert!(matches!(
        result,
        Err(residency_sync::SourceError::TooManyPages { max_pages: 3 })
    ));
}
