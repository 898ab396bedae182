//! # Rendering Backends
//!
//! The engine never draws anything itself. Charts, the calendar, counters, the
//! map and the connection indicator are reached through the traits in this
//! module, so any library (or the in-memory [`headless`] backends) can sit
//! behind them.
//!
//! ## Ownership
//!
//! Map markers are identified by a [`MarkerHandle`]. A handle is created by the
//! map surface, owned exclusively by the marker tracker, and can only be
//! released by passing it back to [`MapSurface::dispose`]. It is deliberately
//! not `Clone`.

pub mod headless;

use crate::dashboard::reconcile::calendar::CalendarEvent;
use crate::dashboard::sync::sync_state::ConnectionStatus;
use crate::shared::{Coordinates, Project, ProjectStatus, RenderError};
use std::fmt;
use uuid::Uuid;

/// Owned reference to a marker living on a map surface
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MarkerHandle(Uuid);

impl MarkerHandle {
    /// Allocate a fresh handle. Only map surfaces should call this.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for MarkerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Summary shown next to the map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapStats {
    pub total_projects: usize,
    pub mapped_projects: usize,
    pub active_projects: usize,
}

/// A map library. Exactly one map surface is active per dashboard session.
pub trait MapSurface: Send {
    /// Construct a marker for `project` at `at`. The marker starts detached.
    fn create_marker(
        &mut self,
        project: &Project,
        at: Coordinates,
    ) -> Result<MarkerHandle, RenderError>;

    /// Put a detached marker on the map
    fn attach(&mut self, marker: &MarkerHandle);

    /// Take a marker off the map without destroying it
    fn detach(&mut self, marker: &MarkerHandle);

    fn move_marker(&mut self, marker: &MarkerHandle, at: Coordinates);

    /// Swap icon and color for a new status
    fn restyle(&mut self, marker: &MarkerHandle, status: &ProjectStatus);

    /// Point the marker's click handler at the latest project payload
    fn bind_click(&mut self, marker: &MarkerHandle, project: &Project);

    /// Destroy a marker. The marker must already be detached.
    fn dispose(&mut self, marker: MarkerHandle);

    fn update_stats(&mut self, _stats: &MapStats) {}

    fn resize(&mut self) {}
}

/// How much of a chart to repaint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawMode {
    /// Data changed in place; skip layout and animations
    Lightweight,
    /// Labels changed; rebuild the chart
    Full,
}

/// Labels plus one value array per dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Vec<f64>>,
}

/// A chart library instance
pub trait ChartSurface: Send {
    fn labels(&self) -> Vec<String>;

    fn datasets(&self) -> Vec<Vec<f64>>;

    /// Overwrite dataset values, keeping labels
    fn set_datasets(&mut self, datasets: &[Vec<f64>]);

    /// Replace labels and datasets
    fn replace(&mut self, series: &ChartSeries);

    fn redraw(&mut self, mode: RedrawMode);
}

/// A calendar library instance
pub trait CalendarSurface: Send {
    fn events(&self) -> Vec<CalendarEvent>;

    fn replace_events(&mut self, events: Vec<CalendarEvent>);

    /// Replace the event with the same id
    fn update_event(&mut self, event: CalendarEvent);
}

/// Identifies one numeric counter on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterKey {
    /// Project count for a status code (`PL`, `OG`, `CP`, `CN`)
    Status(String),
    /// Task metric (`total`, `completed`, `in_progress`, `pending`, `overdue`)
    Task(String),
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKey::Status(code) => write!(f, "status:{}", code),
            CounterKey::Task(metric) => write!(f, "task:{}", metric),
        }
    }
}

/// Cosmetic effect used when a counter changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Brief scale and glow before the new value settles
    Highlight,
}

/// The status and task counter widgets
pub trait CounterSurface: Send {
    /// Currently displayed value, or `None` when the counter is not on this page
    fn value(&self, key: &CounterKey) -> Option<i64>;

    fn set_value(&mut self, key: &CounterKey, value: i64, transition: Transition);
}

/// The small persistent connection indicator
pub trait StatusIndicator: Send + Sync {
    fn show(&self, status: &ConnectionStatus);
}

/// Indicator that only logs
#[derive(Debug, Default)]
pub struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn show(&self, status: &ConnectionStatus) {
        tracing::info!("Dashboard connection: {}", status);
    }
}

/// The set of surfaces present on the current page.
///
/// A surface left as `None` is simply skipped when deltas are applied.
#[derive(Default)]
pub struct Surfaces {
    pub map: Option<Box<dyn MapSurface>>,
    pub progress_chart: Option<Box<dyn ChartSurface>>,
    pub budget_chart: Option<Box<dyn ChartSurface>>,
    pub calendar: Option<Box<dyn CalendarSurface>>,
    pub counters: Option<Box<dyn CounterSurface>>,
}

impl Surfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map(mut self, map: impl MapSurface + 'static) -> Self {
        self.map = Some(Box::new(map));
        self
    }

    pub fn with_progress_chart(mut self, chart: impl ChartSurface + 'static) -> Self {
        self.progress_chart = Some(Box::new(chart));
        self
    }

    pub fn with_budget_chart(mut self, chart: impl ChartSurface + 'static) -> Self {
        self.budget_chart = Some(Box::new(chart));
        self
    }

    pub fn with_calendar(mut self, calendar: impl CalendarSurface + 'static) -> Self {
        self.calendar = Some(Box::new(calendar));
        self
    }

    pub fn with_counters(mut self, counters: impl CounterSurface + 'static) -> Self {
        self.counters = Some(Box::new(counters));
        self
    }
}

impl fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surfaces")
            .field("map", &self.map.is_some())
            .field("progress_chart", &self.progress_chart.is_some())
            .field("budget_chart", &self.budget_chart.is_some())
            .field("calendar", &self.calendar.is_some())
            .field("counters", &self.counters.is_some())
            .finish()
    }
}
