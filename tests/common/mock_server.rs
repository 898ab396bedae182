//! Mock dashboard endpoint helpers
//!
//! Thin wrappers around `wiremock` for serving dashboard snapshots.

use powermason_dashboard::shared::AppConfig;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ENDPOINT: &str = "/api/dashboard/";
pub const TOKEN: &str = "test-token";
pub const ROLE: &str = "PM";

/// Config pointing at `server` with test credentials
pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig::builder()
        .server_url(server.uri())
        .endpoint_path(ENDPOINT)
        .token(TOKEN)
        .role(ROLE)
        .request_timeout_secs(2)
        .build()
        .unwrap()
}

/// Serve `body` for every dashboard request
pub async fn mount_snapshot(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer the next `times` dashboard requests with `status`
pub async fn mount_failures(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(status).set_body_string("Internal Server Error"))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

/// Number of requests the server has seen
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}
