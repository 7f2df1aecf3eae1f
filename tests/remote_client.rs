//! REST remote client against a mocked table API.

use pondkeeper_lib::application::ports::{ConnectivityProbe, RemoteStore};
use pondkeeper_lib::domain::value_objects::{AccountId, RecordId, RecordPayload, TableName};
use pondkeeper_lib::infrastructure::network::RemoteHealthProbe;
use pondkeeper_lib::infrastructure::remote::RestRemoteStore;
use pondkeeper_lib::shared::config::RemoteConfig;
use pondkeeper_lib::AppError;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        base_url: Some(format!("{}/", server.uri())),
        api_key: Some("anon-key".into()),
        access_token: Some("user-jwt".into()),
        request_timeout: 5,
    }
}

fn account() -> AccountId {
    AccountId::new("acc-1".into()).unwrap()
}

fn record_id(raw: &str) -> RecordId {
    RecordId::new(raw.into()).unwrap()
}

#[tokio::test]
async fn upsert_posts_rows_without_sync_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/tanks"))
        .and(query_param("on_conflict", "id"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(body_json(json!([
            { "id": "tank-1", "account_id": "acc-1", "name": "Nursery" }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemoteStore::new(&config(&server)).unwrap();
    let row = RecordPayload::new(json!({
        "id": "tank-1",
        "account_id": "acc-1",
        "name": "Nursery",
        "syncStatus": "queued",
        "lastModified": 1_700_000_000_000i64
    }))
    .unwrap();

    remote.upsert(TableName::Tanks, &[row]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let prefer = requests[0].headers.get("prefer").unwrap().to_str().unwrap();
    assert!(prefer.contains("resolution=merge-duplicates"));
}

#[tokio::test]
async fn upsert_of_nothing_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let remote = RestRemoteStore::new(&config(&server)).unwrap();
    remote.upsert(TableName::Tanks, &[]).await.unwrap();
}

#[tokio::test]
async fn update_and_delete_filter_by_id_and_account() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/feeding_logs"))
        .and(query_param("id", "eq.log-9"))
        .and(query_param("account_id", "eq.acc-1"))
        .and(body_json(json!({ "id": "log-9", "quantity_kg": 2.5 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/feeding_logs"))
        .and(query_param("id", "eq.log-9"))
        .and(query_param("account_id", "eq.acc-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemoteStore::new(&config(&server)).unwrap();
    let fields = RecordPayload::new(json!({
        "id": "log-9",
        "quantity_kg": 2.5,
        "syncStatus": "queued"
    }))
    .unwrap();

    remote
        .update(TableName::FeedingLogs, &account(), &record_id("log-9"), &fields)
        .await
        .unwrap();
    remote
        .delete(TableName::FeedingLogs, &account(), &record_id("log-9"))
        .await
        .unwrap();
}

#[tokio::test]
async fn select_returns_account_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/stocks"))
        .and(query_param("account_id", "eq.acc-1"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "s-1", "account_id": "acc-1", "name": "Tilapia fry", "quantity": 500 },
            { "id": "s-2", "account_id": "acc-1", "name": "Shrimp PL", "quantity": 1200 }
        ])))
        .mount(&server)
        .await;

    let remote = RestRemoteStore::new(&config(&server)).unwrap();
    let rows = remote.select(TableName::Stocks, &account()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record_id().unwrap(), record_id("s-1"));
    assert_eq!(rows[1].get("quantity"), Some(&json!(1200)));
}

#[tokio::test]
async fn http_failures_map_to_retry_classes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tanks"))
        .respond_with(ResponseTemplate::new(403).set_body_string("row-level security"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/farms"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/expenses"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad column"))
        .mount(&server)
        .await;

    let remote = RestRemoteStore::new(&config(&server)).unwrap();

    let err = remote.select(TableName::Tanks, &account()).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(ref msg) if msg.contains("row-level security")));
    assert!(!err.is_retryable());

    let err = remote.select(TableName::Farms, &account()).await.unwrap_err();
    assert!(matches!(err, AppError::RemoteUnavailable(_)));
    assert!(err.is_retryable());

    let err = remote.select(TableName::Expenses, &account()).await.unwrap_err();
    assert!(matches!(err, AppError::RemoteRejected(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_server_is_retryable() {
    let server = MockServer::builder().start().await;
    let cfg = config(&server);
    drop(server);

    let remote = RestRemoteStore::new(&cfg).unwrap();
    let err = remote.select(TableName::Tanks, &account()).await.unwrap_err();
    assert!(err.is_retryable(), "unexpected error class: {err:?}");
}

#[tokio::test]
async fn health_probe_treats_any_response_as_online() {
    let server = MockServer::builder().start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let probe = RemoteHealthProbe::new(&config(&server), Duration::from_secs(2)).unwrap();
    assert!(probe.is_online().await);

    let cfg = config(&server);
    drop(server);
    let probe = RemoteHealthProbe::new(&cfg, Duration::from_millis(500)).unwrap();
    assert!(!probe.is_online().await);
}
