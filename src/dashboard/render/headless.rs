//! # Headless Backends
//!
//! In-memory surfaces that record every call they receive. The `dashboard-sync`
//! binary uses them to log deltas against a live endpoint, and the test suite
//! uses them to count exactly which operations a reconciliation performed.
//!
//! Every surface is a cheap handle around shared state: clone it before
//! handing it to a `DashboardContext` and keep the clone to inspect the record.

use super::{
    CalendarSurface, ChartSeries, ChartSurface, CounterKey, CounterSurface, MapStats, MapSurface,
    MarkerHandle, RedrawMode, StatusIndicator, Transition,
};
use crate::dashboard::reconcile::calendar::CalendarEvent;
use crate::dashboard::sync::sync_state::ConnectionStatus;
use crate::shared::{Coordinates, Project, ProjectStatus, RecordId, RenderError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One call received by a [`HeadlessMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    Create { project: RecordId, marker: Uuid },
    Attach(Uuid),
    Detach(Uuid),
    Move { marker: Uuid, to: Coordinates },
    Restyle { marker: Uuid, status: ProjectStatus },
    BindClick { marker: Uuid, project: RecordId },
    Dispose(Uuid),
}

/// State of one marker on a [`HeadlessMap`]
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRecord {
    pub project: RecordId,
    pub position: Coordinates,
    pub status: ProjectStatus,
    pub attached: bool,
}

#[derive(Debug, Default)]
struct MapState {
    markers: HashMap<Uuid, MarkerRecord>,
    ops: Vec<MapOp>,
    stats: Option<MapStats>,
    fail_for: HashSet<RecordId>,
    resizes: usize,
}

/// Map surface that keeps markers in memory
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    state: Arc<Mutex<MapState>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make marker creation fail for `project`
    pub fn fail_on(&self, project: impl Into<RecordId>) {
        lock(&self.state).fail_for.insert(project.into());
    }

    /// All calls received so far
    pub fn ops(&self) -> Vec<MapOp> {
        lock(&self.state).ops.clone()
    }

    /// Forget the call log, keeping markers
    pub fn clear_ops(&self) {
        lock(&self.state).ops.clear();
    }

    pub fn count_ops(&self, predicate: impl Fn(&MapOp) -> bool) -> usize {
        lock(&self.state).ops.iter().filter(|op| predicate(op)).count()
    }

    /// Markers that exist (attached or not)
    pub fn marker_count(&self) -> usize {
        lock(&self.state).markers.len()
    }

    pub fn attached_count(&self) -> usize {
        lock(&self.state).markers.values().filter(|m| m.attached).count()
    }

    pub fn marker(&self, id: Uuid) -> Option<MarkerRecord> {
        lock(&self.state).markers.get(&id).cloned()
    }

    pub fn stats(&self) -> Option<MapStats> {
        lock(&self.state).stats
    }

    pub fn resizes(&self) -> usize {
        lock(&self.state).resizes
    }

    fn with_marker(&self, marker: &MarkerHandle, op: MapOp, apply: impl FnOnce(&mut MarkerRecord)) {
        let mut state = lock(&self.state);
        match state.markers.get_mut(&marker.id()) {
            Some(record) => apply(record),
            None => tracing::error!("Unknown {}", marker),
        }
        state.ops.push(op);
    }
}

impl MapSurface for HeadlessMap {
    fn create_marker(
        &mut self,
        project: &Project,
        at: Coordinates,
    ) -> Result<MarkerHandle, RenderError> {
        let mut state = lock(&self.state);
        if state.fail_for.contains(&project.id) {
            return Err(RenderError::Backend(format!(
                "cannot create marker for project {}",
                project.id
            )));
        }

        let handle = MarkerHandle::new();
        state.markers.insert(
            handle.id(),
            MarkerRecord {
                project: project.id.clone(),
                position: at,
                status: project.status.clone(),
                attached: false,
            },
        );
        state.ops.push(MapOp::Create {
            project: project.id.clone(),
            marker: handle.id(),
        });
        tracing::debug!("Created {} for project {} at {}", handle, project.id, at);
        Ok(handle)
    }

    fn attach(&mut self, marker: &MarkerHandle) {
        self.with_marker(marker, MapOp::Attach(marker.id()), |m| m.attached = true);
    }

    fn detach(&mut self, marker: &MarkerHandle) {
        self.with_marker(marker, MapOp::Detach(marker.id()), |m| m.attached = false);
    }

    fn move_marker(&mut self, marker: &MarkerHandle, at: Coordinates) {
        let op = MapOp::Move {
            marker: marker.id(),
            to: at,
        };
        self.with_marker(marker, op, |m| m.position = at);
    }

    fn restyle(&mut self, marker: &MarkerHandle, status: &ProjectStatus) {
        let op = MapOp::Restyle {
            marker: marker.id(),
            status: status.clone(),
        };
        self.with_marker(marker, op, |m| m.status = status.clone());
    }

    fn bind_click(&mut self, marker: &MarkerHandle, project: &Project) {
        let op = MapOp::BindClick {
            marker: marker.id(),
            project: project.id.clone(),
        };
        self.with_marker(marker, op, |_| {});
    }

    fn dispose(&mut self, marker: MarkerHandle) {
        let mut state = lock(&self.state);
        if let Some(record) = state.markers.remove(&marker.id()) {
            if record.attached {
                tracing::warn!("Disposed {} while still attached", marker);
            }
        }
        state.ops.push(MapOp::Dispose(marker.id()));
    }

    fn update_stats(&mut self, stats: &MapStats) {
        lock(&self.state).stats = Some(*stats);
    }

    fn resize(&mut self) {
        lock(&self.state).resizes += 1;
    }
}

#[derive(Debug, Default)]
struct ChartState {
    series: ChartSeries,
    redraws: Vec<RedrawMode>,
}

/// Chart surface that stores its series
#[derive(Debug, Clone, Default)]
pub struct HeadlessChart {
    name: &'static str,
    state: Arc<Mutex<ChartState>>,
}

impl HeadlessChart {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::default(),
        }
    }

    pub fn series(&self) -> ChartSeries {
        lock(&self.state).series.clone()
    }

    pub fn redraws(&self) -> Vec<RedrawMode> {
        lock(&self.state).redraws.clone()
    }
}

impl ChartSurface for HeadlessChart {
    fn labels(&self) -> Vec<String> {
        lock(&self.state).series.labels.clone()
    }

    fn datasets(&self) -> Vec<Vec<f64>> {
        lock(&self.state).series.datasets.clone()
    }

    fn set_datasets(&mut self, datasets: &[Vec<f64>]) {
        lock(&self.state).series.datasets = datasets.to_vec();
    }

    fn replace(&mut self, series: &ChartSeries) {
        lock(&self.state).series = series.clone();
    }

    fn redraw(&mut self, mode: RedrawMode) {
        tracing::debug!("{} chart redraw ({:?})", self.name, mode);
        lock(&self.state).redraws.push(mode);
    }
}

#[derive(Debug, Default)]
struct CalendarState {
    events: Vec<CalendarEvent>,
    replacements: usize,
    updates: usize,
}

/// Calendar surface that stores its events
#[derive(Debug, Clone, Default)]
pub struct HeadlessCalendar {
    state: Arc<Mutex<CalendarState>>,
}

impl HeadlessCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replacements(&self) -> usize {
        lock(&self.state).replacements
    }

    pub fn updates(&self) -> usize {
        lock(&self.state).updates
    }
}

impl CalendarSurface for HeadlessCalendar {
    fn events(&self) -> Vec<CalendarEvent> {
        lock(&self.state).events.clone()
    }

    fn replace_events(&mut self, events: Vec<CalendarEvent>) {
        let mut state = lock(&self.state);
        state.events = events;
        state.replacements += 1;
    }

    fn update_event(&mut self, event: CalendarEvent) {
        let mut state = lock(&self.state);
        match state.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => state.events.push(event),
        }
        state.updates += 1;
    }
}

#[derive(Debug, Default)]
struct CounterState {
    values: BTreeMap<CounterKey, i64>,
    highlights: usize,
}

/// Counter surface with a fixed set of counters.
///
/// Only registered keys exist; every other key behaves like a missing element.
#[derive(Debug, Clone, Default)]
pub struct HeadlessCounters {
    state: Arc<Mutex<CounterState>>,
}

impl HeadlessCounters {
    /// Counters for the four project statuses and five task metrics, all zero
    pub fn dashboard() -> Self {
        let counters = Self::default();
        for code in ["PL", "OG", "CP", "CN"] {
            counters.register(CounterKey::Status(code.to_string()));
        }
        for metric in ["total", "completed", "in_progress", "pending", "overdue"] {
            counters.register(CounterKey::Task(metric.to_string()));
        }
        counters
    }

    pub fn register(&self, key: CounterKey) {
        lock(&self.state).values.entry(key).or_insert(0);
    }

    pub fn get(&self, key: &CounterKey) -> Option<i64> {
        lock(&self.state).values.get(key).copied()
    }

    pub fn highlights(&self) -> usize {
        lock(&self.state).highlights
    }
}

impl CounterSurface for HeadlessCounters {
    fn value(&self, key: &CounterKey) -> Option<i64> {
        self.get(key)
    }

    fn set_value(&mut self, key: &CounterKey, value: i64, transition: Transition) {
        let mut state = lock(&self.state);
        if let Some(slot) = state.values.get_mut(key) {
            *slot = value;
            if transition == Transition::Highlight {
                state.highlights += 1;
            }
        }
    }
}

/// Indicator that remembers every status it was shown
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator {
    shown: Arc<Mutex<Vec<String>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        lock(&self.shown).clone()
    }

    pub fn last(&self) -> Option<String> {
        lock(&self.shown).last().cloned()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn show(&self, status: &ConnectionStatus) {
        lock(&self.shown).push(status.to_string());
    }
}
