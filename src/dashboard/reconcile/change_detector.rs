//! # Change Detection
//!
//! Decides whether a freshly fetched snapshot differs from the last applied one
//! in a way that matters for rendering. Detection is a pure function and runs
//! once per successful poll.
//!
//! Checks run cheapest first and stop at the first difference:
//!
//! 1. no previous snapshot
//! 2. timestamp
//! 3. project count
//! 4. project id membership
//! 5. per-project watched fields

use crate::shared::{RecordId, Snapshot};
use std::fmt;

/// Fields always compared between matching projects
pub const DEFAULT_WATCHED_FIELDS: [&str; 5] = [
    "status",
    "progress",
    "location",
    "gps_coordinates",
    "city_province",
];

/// The first difference found between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Initial,
    Timestamp,
    ProjectCount { before: usize, after: usize },
    Membership { added: Vec<RecordId>, removed: Vec<RecordId> },
    Field { project: RecordId, field: String },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Initial => write!(f, "first snapshot"),
            Change::Timestamp => write!(f, "timestamp changed"),
            Change::ProjectCount { before, after } => {
                write!(f, "project count changed: {} -> {}", before, after)
            }
            Change::Membership { added, removed } => write!(
                f,
                "projects changed: {} added, {} removed",
                added.len(),
                removed.len()
            ),
            Change::Field { project, field } => write!(f, "project {} {} changed", project, field),
        }
    }
}

/// Outcome of comparing two snapshots
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Unchanged,
    Changed(Change),
}

impl Detection {
    pub fn is_changed(&self) -> bool {
        matches!(self, Detection::Changed(_))
    }
}

/// Snapshot comparator with a configurable field watch-list
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    fields: Vec<String>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ChangeDetector {
    /// Detector comparing the default fields plus `extra`
    pub fn new<S: Into<String>>(extra: impl IntoIterator<Item = S>) -> Self {
        let mut fields: Vec<String> = DEFAULT_WATCHED_FIELDS.iter().map(|f| f.to_string()).collect();
        for field in extra {
            let field = field.into();
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn detect(&self, previous: Option<&Snapshot>, next: &Snapshot) -> Detection {
        let Some(previous) = previous else {
            return Detection::Changed(Change::Initial);
        };

        if previous.timestamp != next.timestamp {
            return Detection::Changed(Change::Timestamp);
        }

        if previous.projects.len() != next.projects.len() {
            return Detection::Changed(Change::ProjectCount {
                before: previous.projects.len(),
                after: next.projects.len(),
            });
        }

        let before = previous.index_by_id();
        let after = next.index_by_id();

        let mut added: Vec<RecordId> = after
            .keys()
            .filter(|id| !before.contains_key(*id))
            .map(|id| (*id).clone())
            .collect();
        let mut removed: Vec<RecordId> = before
            .keys()
            .filter(|id| !after.contains_key(*id))
            .map(|id| (*id).clone())
            .collect();
        if !added.is_empty() || !removed.is_empty() {
            added.sort();
            removed.sort();
            return Detection::Changed(Change::Membership { added, removed });
        }

        for project in &next.projects {
            let Some(old) = before.get(&project.id) else {
                continue;
            };
            for field in &self.fields {
                if old.field_value(field) != project.field_value(field) {
                    return Detection::Changed(Change::Field {
                        project: project.id.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        Detection::Unchanged
    }
}
