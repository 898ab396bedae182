//! HTTP snapshot client integration tests

use crate::common::*;
use assert_matches::assert_matches;
use powermason_dashboard::dashboard::{HttpSnapshotClient, SnapshotSource};
use powermason_dashboard::shared::{AppConfig, ProjectStatus, RecordId, SyncError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_sends_credentials_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("token", TOKEN))
        .and(query_param("role", ROLE))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body(1717000000)))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSnapshotClient::new(&config_for(&server)).unwrap();
    let snapshot = client.fetch().await.unwrap();

    assert_eq!(snapshot.projects.len(), 3);
    assert_eq!(snapshot.projects[0].name, "Riverside Bridge");
    assert_eq!(snapshot.projects[0].status, ProjectStatus::Ongoing);
    assert_eq!(snapshot.projects[0].progress, 42.5);
    assert_eq!(snapshot.projects[1].id, RecordId::Int(2));
    assert_eq!(snapshot.projects[0].tasks.len(), 2);
    assert_eq!(snapshot.status_counts.get("OG"), Some(&1));
    assert_eq!(snapshot.task_status_counts.get("pending"), Some(&2));
}

#[tokio::test]
async fn test_server_error_maps_to_http_status() {
    let server = MockServer::start().await;
    mount_failures(&server, 500, 1).await;

    let client = HttpSnapshotClient::new(&config_for(&server)).unwrap();
    let result = client.fetch().await;

    assert_matches!(result, Err(SyncError::HttpStatus { status: 500, message }) => {
        crate::assert_contains!(message, "Internal Server Error");
    });
}

#[tokio::test]
async fn test_long_error_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(502).set_body_string("x".repeat(1000)))
        .mount(&server)
        .await;

    let client = HttpSnapshotClient::new(&config_for(&server)).unwrap();
    assert_matches!(
        client.fetch().await,
        Err(SyncError::HttpStatus { status: 502, message }) if message.len() == 200
    );
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let server = MockServer::start().await;
    mount_snapshot(&server, json!({ "success": false, "message": "Session expired" })).await;

    let client = HttpSnapshotClient::new(&config_for(&server)).unwrap();
    assert_matches!(
        client.fetch().await,
        Err(SyncError::Rejected { message }) if message == "Session expired"
    );
}

#[tokio::test]
async fn test_html_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<!DOCTYPE html><html><body>Login</body></html>"),
        )
        .mount(&server)
        .await;

    let client = HttpSnapshotClient::new(&config_for(&server)).unwrap();
    assert_matches!(client.fetch().await, Err(SyncError::Malformed { .. }));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(dashboard_body(1))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = AppConfig {
        request_timeout_secs: 1,
        ..config_for(&server)
    };
    let client = HttpSnapshotClient::new(&config).unwrap();
    assert_matches!(client.fetch().await, Err(SyncError::Timeout));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = AppConfig::builder()
        .server_url("http://127.0.0.1:1")
        .token(TOKEN)
        .role(ROLE)
        .request_timeout_secs(2)
        .build()
        .unwrap();

    let client = HttpSnapshotClient::new(&config).unwrap();
    assert_matches!(client.fetch().await, Err(SyncError::Transport { .. }));
}

#[tokio::test]
async fn test_missing_token_makes_no_request() {
    let server = MockServer::start().await;
    mount_snapshot(&server, dashboard_body(1)).await;

    let config = AppConfig {
        token: None,
        ..config_for(&server)
    };
    let client = HttpSnapshotClient::new(&config).unwrap();

    assert_matches!(client.fetch().await, Err(SyncError::MissingCredentials));
    assert_eq!(request_count(&server).await, 0);
}
