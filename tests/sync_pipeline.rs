//! End-to-end sync runs: mock upstream into the in-memory store

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use residency_sync::config::{EndpointConfig, SourceConfig};
use residency_sync::{
    Company, InMemoryStore, MergeEngine, ResidencyStore, ResidencyType, SyncError, SyncService,
};

async fn mount_listing(server: &MockServer, list_path: &str, records: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(list_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": records })))
        .mount(server)
        .await;
}

fn source_config(server: &MockServer, token: Option<&str>) -> SourceConfig {
    let endpoint = |t: ResidencyType, p: &str| {
        EndpointConfig::new(t, Url::parse(&format!("{}{}", server.uri(), p)).unwrap())
    };
    let mut config = SourceConfig::new(
        vec![
            endpoint(ResidencyType::R1, "/r1/data"),
            endpoint(ResidencyType::R2, "/r2/data"),
        ],
        token.map(String::from),
    );
    config.timeout = Duration::from_secs(5);
    config
}

async fn seeded_server() -> MockServer {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/r1/data",
        json!([
            {
                "id": "recA",
                "fields": {
                    "Name": "R1 | Acme Corp 01",
                    "Residency Title": "Platform Residency",
                    "Job Title": "Backend Engineer",
                    "Monthly Salary": 3200
                },
                "createdTime": "2024-01-05T08:00:00.000Z"
            },
            {
                "id": "recB",
                "fields": { "Name": "R1 | Acme Corp 02", "Job Title": "Data Engineer" },
                "createdTime": "2024-01-06T08:00:00.000Z"
            }
        ]),
    )
    .await;
    mount_listing(
        &server,
        "/r2/data",
        json!([
            {
                "id": "recC",
                "fields": { "Name": "R2 | Über Tech", "Email Application Address": "  " },
                "createdTime": "2024-01-07T08:00:00.000Z"
            }
        ]),
    )
    .await;
    server
}

#[tokio::test]
async fn sync_is_idempotent() {
    let server = seeded_server().await;
    let store = InMemoryStore::new();
    let sync = SyncService::new(source_config(&server, Some("t")), Arc::new(store.clone()));

    let first = sync.run().await.unwrap();
    assert_eq!(first.synced, 3);
    assert_eq!(first.fetched, 3);
    assert_eq!(first.endpoints_ok, 2);
    assert_eq!(first.upsert.inserted, 3);

    let snapshot = |store: InMemoryStore| async move {
        store
            .list_residencies()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.fields(), r.company_id))
            .collect::<Vec<_>>()
    };
    let before = snapshot(store.clone()).await;

    let second = sync.run().await.unwrap();
    assert_eq!(second.synced, 3);
    assert_eq!(second.upsert.inserted, 0);
    assert_eq!(second.upsert.updated, 3);

    assert_eq!(snapshot(store.clone()).await, before);
    assert_eq!(store.company_count().await, 2);

    let recc = store.find_residency_by_external_id("recC").await.unwrap().unwrap();
    assert_eq!(recc.residency_type, ResidencyType::R2);
    assert_eq!(recc.email_address, None);
    let company = store
        .get_company(recc.company_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.slug, "uber-tech");

    let reca = store.find_residency_by_external_id("recA").await.unwrap().unwrap();
    assert_eq!(reca.monthly_salary.as_deref(), Some("3200"));
    assert_eq!(reca.residency_title, "Platform Residency");
}

#[tokio::test]
async fn merged_company_is_not_recreated_by_next_sync() {
    let server = seeded_server().await;
    let store = InMemoryStore::new();
    let target = Company::new("Acme Corporation", "acme-corporation");
    store.insert_company(target.clone()).await.unwrap();

    let sync = SyncService::new(source_config(&server, Some("t")), Arc::new(store.clone()));
    sync.run().await.unwrap();

    let duplicate = store.find_company_by_slug("acme-corp").await.unwrap().unwrap();
    let merge = MergeEngine::new(Arc::new(store.clone()));
    let report = merge.merge(target.id, &[duplicate.id]).await.unwrap();
    assert_eq!(report.residencies_repointed, 2);

    sync.run().await.unwrap();

    assert!(store.find_company_by_slug("acme-corp").await.unwrap().is_none());
    let reca = store.find_residency_by_external_id("recA").await.unwrap().unwrap();
    assert_eq!(reca.company_id, Some(target.id));
}

#[tokio::test]
async fn failing_endpoint_does_not_fail_the_run() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/r1/data",
        json!([
            { "id": "recA", "fields": { "Name": "R1 | Acme" }, "createdTime": "2024-01-05T08:00:00.000Z" },
            { "id": "recB", "fields": { "Name": "R1 | Globex" }, "createdTime": "2024-01-05T08:00:00.000Z" }
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/r2/data"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "/r3/data",
        json!([
            { "id": "recC", "fields": { "Name": "R3 | Initech" }, "createdTime": "2024-01-07T08:00:00.000Z" }
        ]),
    )
    .await;

    let mut config = source_config(&server, Some("t"));
    config.endpoints.push(EndpointConfig::new(
        ResidencyType::R3,
        Url::parse(&format!("{}/r3/data", server.uri())).unwrap(),
    ));

    let store = InMemoryStore::new();
    let sync = SyncService::new(config, Arc::new(store.clone()));

    let report = sync.run().await.unwrap();

    assert_eq!(report.synced, 3);
    assert_eq!(report.endpoints_ok, 2);
    assert_eq!(report.endpoints_failed, 1);
    assert_eq!(store.residency_count().await, 3);
    let recc = store.find_residency_by_external_id("recC").await.unwrap().unwrap();
    assert_eq!(recc.residency_type, ResidencyType::R3);
}

#[tokio::test]
async fn missing_token_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let store = InMemoryStore::new();
    let sync = SyncService::new(source_config(&server, None), Arc::new(store.clone()));

    let err = sync.run().await.unwrap_err();
    assert!(matches!(err, SyncError::MissingCredential));
    assert_eq!(store.residency_count().await, 0);
}

#[tokio::test]
async fn concurrent_run_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "records": [] }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let sync = SyncService::new(
        source_config(&server, Some("t")),
        Arc::new(InMemoryStore::new()),
    );

    let background = sync.clone();
    let first = tokio::spawn(async move { background.run().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = sync.run().await.unwrap_err();
    assert!(matches!(err, SyncError::AlreadyRunning));

    assert!(first.await.unwrap().is_ok());
    assert!(!sync.is_running());
}
