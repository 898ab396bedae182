//! # Calendar Events
//!
//! Derives one calendar event per scheduled task and pushes the difference to
//! a [`CalendarSurface`].
//!
//! Events are colored per project from a fixed palette, assigned in project
//! order by name. When the set of event ids is unchanged only the events whose
//! content changed are updated; otherwise the calendar is repopulated.

use crate::dashboard::render::CalendarSurface;
use crate::shared::{Project, RecordId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Project colors, reused cyclically
pub const PROJECT_PALETTE: [&str; 12] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
    "#84CC16", "#06B6D4", "#6366F1", "#8B5A2B",
];

/// Color for a project missing from the palette assignment
pub const FALLBACK_COLOR: &str = "#6B7280";

/// An all-day calendar entry for one task
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// `task_<task id>`
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub color: String,
    pub project_name: String,
    pub project_id: RecordId,
    pub progress: f64,
    pub status: String,
    pub is_overdue: bool,
}

/// Result of applying events to a calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarDelta {
    Unchanged,
    /// Same event ids; this many events changed in place
    Updated(usize),
    /// Event ids differed; every event was replaced
    Replaced,
}

/// Assign each distinct project name a palette color
pub fn project_colors(projects: &[Project]) -> HashMap<String, &'static str> {
    let mut colors = HashMap::new();
    for project in projects {
        if !colors.contains_key(&project.name) {
            let color = PROJECT_PALETTE[colors.len() % PROJECT_PALETTE.len()];
            colors.insert(project.name.clone(), color);
        }
    }
    colors
}

/// Events for every task with a start date, in project then task order
pub fn generate_events(projects: &[Project]) -> Vec<CalendarEvent> {
    let colors = project_colors(projects);
    projects
        .iter()
        .flat_map(|project| {
            let color = colors.get(&project.name).copied().unwrap_or(FALLBACK_COLOR);
            project.tasks.iter().filter_map(move |task| {
                Some(CalendarEvent {
                    id: format!("task_{}", task.id),
                    title: task.title.clone(),
                    start: task.start?,
                    end: task.end,
                    color: color.to_string(),
                    project_name: project.name.clone(),
                    project_id: project.id.clone(),
                    progress: task.progress,
                    status: task.status.clone(),
                    is_overdue: task.is_overdue,
                })
            })
        })
        .collect()
}

/// Bring `calendar` in line with `projects`
pub fn apply_calendar(calendar: &mut dyn CalendarSurface, projects: &[Project]) -> CalendarDelta {
    let events = generate_events(projects);
    let current = calendar.events();

    let current_ids: BTreeSet<&str> = current.iter().map(|e| e.id.as_str()).collect();
    let next_ids: BTreeSet<&str> = events.iter().map(|e| e.id.as_str()).collect();

    if current_ids != next_ids || current.len() != events.len() {
        tracing::debug!(
            "Calendar events changed: {} -> {}",
            current.len(),
            events.len()
        );
        calendar.replace_events(events);
        return CalendarDelta::Replaced;
    }

    let existing: HashMap<&str, &CalendarEvent> =
        current.iter().map(|e| (e.id.as_str(), e)).collect();
    let changed: Vec<CalendarEvent> = events
        .iter()
        .filter(|event| existing.get(event.id.as_str()).copied() != Some(*event))
        .cloned()
        .collect();

    if changed.is_empty() {
        return CalendarDelta::Unchanged;
    }

    let count = changed.len();
    for event in changed {
        calendar.update_event(event);
    }
    tracing::debug!("Updated {} calendar events", count);
    CalendarDelta::Updated(count)
}
