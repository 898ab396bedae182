//! Multi-snapshot reconciliation scenarios
//!
//! Each test feeds a sequence of snapshots through a fully wired
//! `DashboardContext` and checks exactly which surface operations happened.

use crate::common::*;
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use powermason_dashboard::dashboard::context::ReconcileOutcome;
use powermason_dashboard::dashboard::reconcile::{CalendarDelta, Change, ChartDelta};
use powermason_dashboard::dashboard::render::headless::MapOp;
use powermason_dashboard::dashboard::render::{CalendarSurface, CounterKey, RedrawMode};
use powermason_dashboard::shared::{ProjectStatus, RecordId, Snapshot};

#[test]
fn test_identical_snapshot_performs_no_marker_operations() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    let a = snapshot(1, vec![project(1, "PL", "14.5,120.9")]);
    assert_matches!(context.apply(a.clone()), ReconcileOutcome::Applied { change: Change::Initial, .. });
    dashboard.map.clear_ops();

    assert_eq!(context.apply(a), ReconcileOutcome::Unchanged);
    assert!(dashboard.map.ops().is_empty());
}

#[test]
fn test_status_change_swaps_icon_only() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    context.apply(snapshot(1, vec![project(1, "PL", "14.5,120.9")]));
    dashboard.map.clear_ops();

    let outcome = context.apply(snapshot(1, vec![project(1, "CP", "14.5,120.9")]));
    let report = match outcome {
        ReconcileOutcome::Applied { change, report } => {
            assert_eq!(
                change,
                Change::Field {
                    project: RecordId::Int(1),
                    field: "status".to_string()
                }
            );
            report
        }
        ReconcileOutcome::Unchanged => panic!("status change was not detected"),
    };

    crate::assert_report!(report.markers.unwrap(), updated = 1, created = 0, hidden = 0);
    crate::assert_map_ops!(
        dashboard.map,
        MapOp::Restyle { status: ProjectStatus::Completed, .. } => 1,
        MapOp::Create { .. } => 0,
        MapOp::Detach(_) => 0,
        MapOp::Dispose(_) => 0,
        MapOp::Move { .. } => 0,
    );
}

#[test]
fn test_replaced_project_hides_old_marker_and_creates_new() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    context.apply(snapshot(1, vec![project(1, "PL", "14.5,120.9")]));
    let first = context
        .tracker()
        .and_then(|t| t.handle_id(&RecordId::Int(1)))
        .unwrap();
    dashboard.map.clear_ops();

    let outcome = context.apply(snapshot(1, vec![project(2, "OG", "10.3,123.9")]));
    assert_matches!(
        outcome,
        ReconcileOutcome::Applied { change: Change::Membership { ref added, ref removed }, ref report } => {
            assert_eq!(added, &vec![RecordId::Int(2)]);
            assert_eq!(removed, &vec![RecordId::Int(1)]);
            crate::assert_report!(report.markers.unwrap(), created = 1, hidden = 1);
        }
    );

    crate::assert_map_ops!(
        dashboard.map,
        MapOp::Detach(_) => 1,
        MapOp::Create { .. } => 1,
        MapOp::Dispose(_) => 0,
    );
    assert!(dashboard.map.ops().contains(&MapOp::Detach(first)));

    // The hidden marker still exists and comes back on the same handle
    let tracker = context.tracker().unwrap();
    assert!(tracker.is_tracked(&RecordId::Int(1)));
    assert!(!tracker.is_visible(&RecordId::Int(1)));
    assert_eq!(dashboard.map.marker_count(), 2);

    dashboard.map.clear_ops();
    context.apply(snapshot(
        2,
        vec![project(1, "PL", "14.5,120.9"), project(2, "OG", "10.3,123.9")],
    ));
    crate::assert_map_ops!(
        dashboard.map,
        MapOp::Create { .. } => 0,
        MapOp::Attach(_) => 1,
    );
    assert_eq!(
        context.tracker().and_then(|t| t.handle_id(&RecordId::Int(1))),
        Some(first)
    );
}

#[test]
fn test_malformed_coordinates_are_skipped() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    let outcome = context.apply(snapshot(
        1,
        vec![project(1, "PL", "14.5,120.9"), project(2, "PL", "abc,xyz")],
    ));

    assert_matches!(outcome, ReconcileOutcome::Applied { report, .. } => {
        crate::assert_report!(report.markers.unwrap(), created = 1, skipped = 1);
    });
    let stats = dashboard.map.stats().unwrap();
    assert_eq!(stats.total_projects, 2);
    assert_eq!(stats.mapped_projects, 1);
}

#[test]
fn test_full_body_renders_every_surface() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    let body = dashboard_body(1717000000).to_string();
    let snapshot = Snapshot::from_json(&body).unwrap();

    let report = match context.apply(snapshot) {
        ReconcileOutcome::Applied { report, .. } => report,
        ReconcileOutcome::Unchanged => panic!("first snapshot must render"),
    };

    assert_eq!(report.progress_chart, Some(ChartDelta::Rebuilt));
    assert_eq!(report.budget_chart, Some(ChartDelta::Rebuilt));
    assert_eq!(report.calendar, Some(CalendarDelta::Replaced));
    crate::assert_report!(report.markers.unwrap(), created = 2, skipped = 1);

    assert_eq!(dashboard.counters.get(&CounterKey::Status("OG".into())), Some(1));
    assert_eq!(dashboard.counters.get(&CounterKey::Task("pending".into())), Some(2));
    assert_eq!(
        dashboard.progress.series().labels,
        vec!["Riverside Bridge", "Harbor Warehouse", "Mountain Road"]
    );
    assert_eq!(dashboard.progress.series().datasets[1][0], 42.5);
    assert_eq!(dashboard.budget.series().datasets[0][0], 1200000.0);
    assert_eq!(dashboard.progress.redraws(), vec![RedrawMode::Full]);
    assert_eq!(dashboard.map.resizes(), 1);

    let events = dashboard.calendar.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "task_101");
    assert_eq!(events[0].project_name, "Riverside Bridge");
    assert_ne!(events[0].color, events[1].color);
}

#[test]
fn test_progress_update_redraws_lightly() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    context.apply(snapshot(1, vec![project(1, "OG", "14.5,120.9").with_progress(10.0)]));
    let outcome = context.apply(snapshot(1, vec![project(1, "OG", "14.5,120.9").with_progress(35.0)]));

    assert_matches!(outcome, ReconcileOutcome::Applied { report, .. } => {
        assert_eq!(report.progress_chart, Some(ChartDelta::DataOnly));
        assert_eq!(report.budget_chart, Some(ChartDelta::Unchanged));
        assert_eq!(report.calendar, Some(CalendarDelta::Unchanged));
        // Progress is part of the marker popup, so the marker refreshes in place
        crate::assert_report!(report.markers.unwrap(), updated = 1, created = 0);
    });
    assert_eq!(
        dashboard.progress.redraws(),
        vec![RedrawMode::Full, RedrawMode::Lightweight]
    );
    crate::assert_map_ops!(dashboard.map, MapOp::Move { .. } => 0, MapOp::Restyle { .. } => 0);
}

#[test]
fn test_status_filter_hides_and_reshows_markers() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();

    context.apply(snapshot(
        1,
        vec![
            project(1, "PL", "14.5,120.9"),
            project(2, "OG", "10.3,123.9"),
            project(3, "CP", "7.1,125.6"),
        ],
    ));
    assert_eq!(dashboard.map.attached_count(), 3);

    let report = context.set_filter(Some(ProjectStatus::Ongoing)).unwrap();
    crate::assert_report!(report.markers.unwrap(), hidden = 2, unchanged = 1);
    assert_eq!(dashboard.map.attached_count(), 1);
    assert_eq!(dashboard.progress.series().labels, vec!["Project 2"]);

    dashboard.map.clear_ops();
    let report = context.set_filter(None).unwrap();
    crate::assert_report!(report.markers.unwrap(), reshown = 2, created = 0);
    assert_eq!(dashboard.map.attached_count(), 3);
    crate::assert_map_ops!(dashboard.map, MapOp::Create { .. } => 0);
}

#[test]
fn test_clear_tracking_disposes_and_rebuilds() {
    let dashboard = Dashboard::new();
    let mut context = dashboard.context();
    let projects = vec![project(1, "PL", "14.5,120.9"), project(2, "OG", "10.3,123.9")];

    context.apply(snapshot(1, projects.clone()));
    assert_eq!(context.clear_tracking(), 2);
    assert_eq!(dashboard.map.marker_count(), 0);
    assert!(context.last_snapshot().is_none());

    // Same snapshot again is a fresh start
    assert_matches!(
        context.apply(snapshot(1, projects)),
        ReconcileOutcome::Applied { change: Change::Initial, .. }
    );
    assert_eq!(dashboard.map.attached_count(), 2);
}

#[test]
fn test_marker_creation_failure_is_isolated() {
    let dashboard = Dashboard::new();
    dashboard.map.fail_on(2);
    let mut context = dashboard.context();

    let outcome = context.apply(snapshot(
        1,
        vec![project(1, "PL", "14.5,120.9"), project(2, "PL", "10.3,123.9")],
    ));

    assert_matches!(outcome, ReconcileOutcome::Applied { report, .. } => {
        crate::assert_report!(report.markers.unwrap(), created = 1, failed = 1);
    });
    assert_eq!(dashboard.map.attached_count(), 1);
    assert!(!context.tracker().unwrap().is_tracked(&RecordId::Int(2)));
}
