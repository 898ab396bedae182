//! # Dashboard Context
//!
//! The single owner of everything a reconciliation touches: the rendering
//! surfaces, the last applied snapshot, the marker tracker and the active
//! status filter. The sync service holds it behind a `tokio::sync::Mutex` and
//! calls [`DashboardContext::apply`] once per successful poll.
//!
//! ## Usage
//!
//! ```rust
//! use powermason_dashboard::dashboard::context::{DashboardContext, ReconcileOutcome};
//! use powermason_dashboard::dashboard::render::{headless::HeadlessMap, Surfaces};
//! use powermason_dashboard::shared::{Project, Snapshot};
//!
//! let map = HeadlessMap::new();
//! let mut context = DashboardContext::new(Surfaces::new().with_map(map.clone()));
//!
//! let snapshot = Snapshot::new(1, vec![Project::new(1, "Bridge").with_coordinates("14.5,120.9")]);
//! assert!(matches!(context.apply(snapshot.clone()), ReconcileOutcome::Applied { .. }));
//! assert!(matches!(context.apply(snapshot), ReconcileOutcome::Unchanged));
//! assert_eq!(map.attached_count(), 1);
//! ```

use crate::dashboard::reconcile::{
    apply_calendar, apply_chart, apply_counters, CalendarDelta, Change, ChangeDetector, ChartDelta,
    ChartKind, Detection, MarkerReport, MarkerTracker,
};
use crate::dashboard::render::Surfaces;
use crate::shared::{Project, ProjectStatus, Snapshot};
use std::fmt;

/// What one render pass pushed to the surfaces.
///
/// A `None` field means the surface is not present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub counters_changed: usize,
    pub progress_chart: Option<ChartDelta>,
    pub budget_chart: Option<ChartDelta>,
    pub calendar: Option<CalendarDelta>,
    pub markers: Option<MarkerReport>,
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} counters", self.counters_changed)?;
        if let Some(delta) = self.progress_chart {
            write!(f, ", progress chart {:?}", delta)?;
        }
        if let Some(delta) = self.budget_chart {
            write!(f, ", budget chart {:?}", delta)?;
        }
        if let Some(delta) = self.calendar {
            write!(f, ", calendar {:?}", delta)?;
        }
        if let Some(markers) = &self.markers {
            write!(f, ", markers: {}", markers)?;
        }
        Ok(())
    }
}

/// Result of offering a snapshot to the context
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Nothing relevant changed; no surface was touched
    Unchanged,
    Applied { change: Change, report: RenderReport },
}

/// Owner of the dashboard's render state
#[derive(Debug)]
pub struct DashboardContext {
    surfaces: Surfaces,
    detector: ChangeDetector,
    last_snapshot: Option<Snapshot>,
    /// Created on the first marker update
    tracker: Option<MarkerTracker>,
    filter: Option<ProjectStatus>,
}

impl DashboardContext {
    pub fn new(surfaces: Surfaces) -> Self {
        Self::with_detector(surfaces, ChangeDetector::default())
    }

    pub fn with_detector(surfaces: Surfaces, detector: ChangeDetector) -> Self {
        Self {
            surfaces,
            detector,
            last_snapshot: None,
            tracker: None,
            filter: None,
        }
    }

    /// Reconcile `snapshot` if it differs from the last applied one
    pub fn apply(&mut self, snapshot: Snapshot) -> ReconcileOutcome {
        let change = match self.detector.detect(self.last_snapshot.as_ref(), &snapshot) {
            Detection::Unchanged => {
                tracing::debug!("Dashboard data unchanged");
                return ReconcileOutcome::Unchanged;
            }
            Detection::Changed(change) => change,
        };

        tracing::info!("Dashboard data changed ({}), updating", change);
        let report = self.render(&snapshot);
        self.last_snapshot = Some(snapshot);
        ReconcileOutcome::Applied { change, report }
    }

    /// Show only projects with `status`, or every project for `None`.
    ///
    /// Re-renders immediately from the last snapshot. Returns `None` when
    /// nothing has been applied yet.
    pub fn set_filter(&mut self, status: Option<ProjectStatus>) -> Option<RenderReport> {
        match &status {
            Some(status) => tracing::info!("Filtering dashboard by status {}", status),
            None => tracing::info!("Showing all projects"),
        }
        self.filter = status;

        let snapshot = self.last_snapshot.take()?;
        let report = self.render(&snapshot);
        self.last_snapshot = Some(snapshot);
        Some(report)
    }

    pub fn filter(&self) -> Option<&ProjectStatus> {
        self.filter.as_ref()
    }

    /// Dispose every marker. The next snapshot recreates them.
    pub fn clear_tracking(&mut self) -> usize {
        let cleared = match (self.tracker.as_mut(), self.surfaces.map.as_deref_mut()) {
            (Some(tracker), Some(map)) => tracker.clear(map),
            _ => 0,
        };
        self.last_snapshot = None;
        cleared
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn tracker(&self) -> Option<&MarkerTracker> {
        self.tracker.as_ref()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    fn visible_projects<'a>(&self, snapshot: &'a Snapshot) -> Vec<&'a Project> {
        snapshot
            .projects
            .iter()
            .filter(|p| self.filter.as_ref().map_or(true, |status| &p.status == status))
            .collect()
    }

    fn render(&mut self, snapshot: &Snapshot) -> RenderReport {
        let projects: Vec<Project> = self.visible_projects(snapshot).into_iter().cloned().collect();
        let mut report = RenderReport::default();

        if let Some(counters) = self.surfaces.counters.as_deref_mut() {
            report.counters_changed = apply_counters(counters, snapshot);
        }
        if let Some(chart) = self.surfaces.progress_chart.as_deref_mut() {
            report.progress_chart = Some(apply_chart(chart, ChartKind::Progress, &projects));
        }
        if let Some(chart) = self.surfaces.budget_chart.as_deref_mut() {
            report.budget_chart = Some(apply_chart(chart, ChartKind::Budget, &projects));
        }
        if let Some(calendar) = self.surfaces.calendar.as_deref_mut() {
            report.calendar = Some(apply_calendar(calendar, &projects));
        }
        if let Some(map) = self.surfaces.map.as_deref_mut() {
            let tracker = self.tracker.get_or_insert_with(MarkerTracker::new);
            let markers = tracker.reconcile(map, &projects);
            if markers.operations() > 0 {
                map.resize();
            }
            report.markers = Some(markers);
        }

        tracing::debug!("Render complete: {}", report);
        report
    }
}
