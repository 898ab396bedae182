//! Sync service integration tests
//!
//! Drive a real `SyncService` over HTTP against a mock dashboard endpoint.

use crate::common::*;
use assert_matches::assert_matches;
use powermason_dashboard::dashboard::render::headless::RecordingIndicator;
use powermason_dashboard::dashboard::render::CalendarSurface;
use powermason_dashboard::dashboard::sync::retry::{FailureAction, RetryPolicy};
use powermason_dashboard::dashboard::sync::sync_state::ConnectionStatus;
use powermason_dashboard::dashboard::sync::SkipReason;
use powermason_dashboard::dashboard::{HttpSnapshotClient, PollOutcome, SyncConfig, SyncService};
use powermason_dashboard::shared::SyncError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERVAL: Duration = Duration::from_secs(60);

fn sync_config() -> SyncConfig {
    SyncConfig {
        poll_interval: INTERVAL,
        retry: RetryPolicy {
            max_retries: 2,
            retry_delay: Duration::from_millis(200),
            backoff_factor: 1.5,
            max_interval: Duration::from_secs(120),
        },
    }
}

fn service(server: &MockServer, dashboard: &Dashboard, indicator: &RecordingIndicator) -> SyncService {
    let client = HttpSnapshotClient::new(&config_for(server)).unwrap();
    SyncService::new(
        sync_config(),
        Arc::new(client),
        dashboard.context(),
        Arc::new(indicator.clone()),
    )
}

/// Wait until the service reports `expected`, failing after a few seconds
async fn wait_for_status(service: &SyncService, expected: ConnectionStatus) {
    for _ in 0..100 {
        if service.status().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "status never became {}, last was {}",
        expected,
        service.status().await
    );
}

/// Wait until `count` polls have finished, successfully or not
async fn wait_for_polls(service: &SyncService, count: u64) {
    for _ in 0..100 {
        let metrics = service.metrics().await;
        if metrics.successful_polls + metrics.failed_polls >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("fewer than {} polls finished", count);
}

#[tokio::test]
async fn test_start_renders_first_snapshot() {
    let server = MockServer::start().await;
    mount_snapshot(&server, dashboard_body(1717000000)).await;

    let dashboard = Dashboard::new();
    let indicator = RecordingIndicator::new();
    let mut service = service(&server, &dashboard, &indicator);

    service.start(INTERVAL).await;
    wait_for_polls(&service, 1).await;
    crate::assert_status!(service, "active");

    {
        let context = service.context();
        let context = context.lock().await;
        let tracker = context.tracker().expect("map was rendered");
        assert_eq!(tracker.visible_count(), 2);
    }
    assert_eq!(dashboard.map.attached_count(), 2);
    assert_eq!(dashboard.map.stats().map(|s| s.mapped_projects), Some(2));
    assert_eq!(dashboard.calendar.events().len(), 2);
    assert_eq!(dashboard.progress.series().labels.len(), 3);

    let metrics = service.metrics().await;
    assert_eq!(metrics.successful_polls, 1);
    assert_eq!(metrics.applied_polls, 1);
    assert_eq!(indicator.last().as_deref(), Some("active"));

    service.stop().await;
    crate::assert_status!(service, "stopped");
}

#[tokio::test]
async fn test_repeated_snapshot_is_not_rerendered() {
    let server = MockServer::start().await;
    mount_snapshot(&server, dashboard_body(42)).await;

    let dashboard = Dashboard::new();
    let indicator = RecordingIndicator::new();
    let mut service = service(&server, &dashboard, &indicator);

    service.start(INTERVAL).await;
    wait_for_polls(&service, 1).await;
    dashboard.map.clear_ops();

    assert_eq!(service.force_refresh().await, PollOutcome::Unchanged);
    assert!(dashboard.map.ops().is_empty());
    assert_eq!(dashboard.calendar.replacements(), 1);

    service.stop().await;
}

#[tokio::test]
async fn test_failures_retry_then_degrade_then_recover() {
    let server = MockServer::start().await;
    // Two failures take the first fetch and its retry; everything after succeeds
    mount_failures(&server, 500, 2).await;
    mount_snapshot(&server, dashboard_body(7)).await;

    let dashboard = Dashboard::new();
    let indicator = RecordingIndicator::new();
    let mut service = service(&server, &dashboard, &indicator);

    service.start(INTERVAL).await;
    wait_for_status(&service, ConnectionStatus::Degraded).await;

    let state = service.state().await;
    assert_eq!(state.consecutive_failures, 2);
    assert_eq!(state.interval, Duration::from_secs(90));
    crate::assert_contains!(state.last_error.unwrap_or_default(), "HTTP 500");

    let history = indicator.history();
    assert!(history.contains(&"retrying (1/2)".to_string()), "history: {:?}", history);

    assert_matches!(service.force_refresh().await, PollOutcome::Applied { .. });
    crate::assert_status!(service, "active");
    let state = service.state().await;
    assert_eq!(state.consecutive_failures, 0);
    assert_eq!(state.interval, INTERVAL);

    service.stop().await;
}

#[tokio::test]
async fn test_failure_keeps_last_good_dashboard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body(1)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dashboard = Dashboard::new();
    let indicator = RecordingIndicator::new();
    let mut service = service(&server, &dashboard, &indicator);

    service.start(INTERVAL).await;
    wait_for_polls(&service, 1).await;
    let labels = dashboard.progress.series().labels;

    assert_matches!(
        service.force_refresh().await,
        PollOutcome::Failed {
            error: SyncError::HttpStatus { status: 503, .. },
            action: FailureAction::RetryAfter { attempt: 1, .. }
        }
    );

    assert_eq!(dashboard.map.attached_count(), 2);
    assert_eq!(dashboard.progress.series().labels, labels);
    assert!(service.context().lock().await.last_snapshot().is_some());

    service.stop().await;
}

#[tokio::test]
async fn test_hidden_dashboard_skips_timer_but_not_manual_refresh() {
    let server = MockServer::start().await;
    mount_snapshot(&server, dashboard_body(3)).await;

    let dashboard = Dashboard::new();
    let indicator = RecordingIndicator::new();
    let mut service = service(&server, &dashboard, &indicator);

    service.start(INTERVAL).await;
    wait_for_polls(&service, 1).await;

    service.set_visibility(false).await;
    assert_eq!(service.tick().await, PollOutcome::Skipped(SkipReason::Hidden));
    assert_eq!(request_count(&server).await, 1);

    assert_eq!(service.force_refresh().await, PollOutcome::Unchanged);
    assert_eq!(request_count(&server).await, 2);

    service.set_visibility(true).await;
    wait_for_polls(&service, 3).await;
    assert_eq!(request_count(&server).await, 3);

    service.stop().await;
}
