//! Property-based tests for marker reconciliation

use powermason_dashboard::dashboard::reconcile::MarkerTracker;
use powermason_dashboard::dashboard::render::headless::{HeadlessMap, MapOp};
use powermason_dashboard::shared::{Project, RecordId};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn valid_gps() -> impl Strategy<Value = String> {
    (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| format!("{},{}", lat, lng))
}

fn invalid_gps() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("abc,xyz".to_string()),
        Just("14.5".to_string()),
        Just("1,2,3".to_string()),
        Just("91.0,10.0".to_string()),
        Just("10.0,181.0".to_string()),
        Just(String::new()),
        "[a-z]{1,8}",
    ]
}

/// `valid` projects with usable coordinates followed by `invalid` without
fn batch(valid: usize, invalid: usize) -> impl Strategy<Value = Vec<Project>> {
    (
        prop::collection::vec(valid_gps(), valid),
        prop::collection::vec(invalid_gps(), invalid),
    )
        .prop_map(|(good, bad)| {
            good.into_iter()
                .chain(bad)
                .enumerate()
                .map(|(i, gps)| Project::new(i as i64, format!("Project {}", i)).with_coordinates(gps))
                .collect()
        })
}

fn sized_batch() -> impl Strategy<Value = (usize, usize, Vec<Project>)> {
    (0usize..15, 0usize..8).prop_flat_map(|(n, m)| (Just(n), Just(m), batch(n, m)))
}

proptest! {
    #[test]
    fn test_only_valid_coordinates_are_shown((n, m, projects) in sized_batch()) {
        let mut map = HeadlessMap::new();
        let mut tracker = MarkerTracker::new();

        let report = tracker.reconcile(&mut map, &projects);

        prop_assert_eq!(report.created, n);
        prop_assert_eq!(report.skipped, m);
        prop_assert_eq!(tracker.visible_count(), n);
        prop_assert_eq!(map.attached_count(), n);
    }

    #[test]
    fn test_second_pass_is_a_no_op((_, _, projects) in sized_batch()) {
        let mut map = HeadlessMap::new();
        let mut tracker = MarkerTracker::new();

        tracker.reconcile(&mut map, &projects);
        map.clear_ops();
        let report = tracker.reconcile(&mut map, &projects);

        prop_assert_eq!(report.operations(), 0);
        prop_assert!(map.ops().is_empty());
    }

    #[test]
    fn test_one_marker_per_project(
        (_, _, projects) in sized_batch(),
        subsets in prop::collection::vec(prop::collection::vec(any::<bool>(), 15 + 8), 1..6),
    ) {
        let mut map = HeadlessMap::new();
        let mut tracker = MarkerTracker::new();

        for mask in subsets {
            let visible: Vec<Project> = projects
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(p, _)| p.clone())
                .collect();
            tracker.reconcile(&mut map, &visible);

            let expected: BTreeSet<RecordId> = visible
                .iter()
                .filter(|p| tracker.is_visible(&p.id))
                .map(|p| p.id.clone())
                .collect();
            prop_assert_eq!(tracker.visible_count(), expected.len());
            prop_assert_eq!(map.attached_count(), expected.len());
        }

        // Markers are only ever created once per project id
        let created: Vec<RecordId> = map
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                MapOp::Create { project, .. } => Some(project),
                _ => None,
            })
            .collect();
        let unique: BTreeSet<&RecordId> = created.iter().collect();
        prop_assert_eq!(created.len(), unique.len());
        prop_assert_eq!(map.marker_count(), tracker.tracked_count());
        prop_assert!(map.ops().iter().all(|op| !matches!(op, MapOp::Dispose(_))));
    }

    #[test]
    fn test_hidden_markers_keep_their_handle((n, _, projects) in sized_batch()) {
        prop_assume!(n > 0);
        let mut map = HeadlessMap::new();
        let mut tracker = MarkerTracker::new();

        tracker.reconcile(&mut map, &projects);
        let handles: Vec<_> = projects
            .iter()
            .filter_map(|p| tracker.handle_id(&p.id))
            .collect();

        let report = tracker.reconcile(&mut map, &[]);
        prop_assert_eq!(report.hidden, n);
        prop_assert_eq!(map.attached_count(), 0);

        let report = tracker.reconcile(&mut map, &projects);
        prop_assert_eq!(report.reshown, n);
        prop_assert_eq!(report.created, 0);
        let after: Vec<_> = projects
            .iter()
            .filter_map(|p| tracker.handle_id(&p.id))
            .collect();
        prop_assert_eq!(handles, after);
    }
}
