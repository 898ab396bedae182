//! Reconciliation
//!
//! Everything that turns a fetched snapshot into backend calls: deciding
//! whether anything changed, and pushing the minimal set of updates to the
//! map, charts, counters and calendar.

pub mod calendar;
pub mod change_detector;
pub mod delta;
pub mod marker_tracker;

pub use calendar::{apply_calendar, CalendarDelta, CalendarEvent};
pub use change_detector::{Change, ChangeDetector, Detection};
pub use delta::{apply_chart, apply_counters, ChartDelta, ChartKind};
pub use marker_tracker::{ContentHash, MarkerReport, MarkerTracker};
