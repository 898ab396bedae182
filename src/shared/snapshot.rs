/**
 * Dashboard Snapshot
 *
 * A snapshot is one payload fetched from the dashboard endpoint: the version
 * marker, the project list, and the status counters. `SnapshotResponse` is the
 * wire envelope; `Snapshot` is the normalized form the engine reconciles.
 *
 * # Wire Format
 *
 * ```json
 * { "success": true, "timestamp": 1717000000.5,
 *   "projects": [ { "id": 1, "name": "...", "status": "PL", "gps_coordinates": "14.5,120.9" } ],
 *   "status_counts": { "planned": 1, "ongoing": 0, "completed": 0, "cancelled": 0 },
 *   "task_status_counts": { "total": 3, "completed": 1, "in_progress": 1, "pending": 1, "overdue": 0 } }
 * ```
 */
use crate::shared::error::SyncError;
use crate::shared::project::{Project, ProjectStatus, RawProject, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Opaque version marker, compared by equality only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Number(n) => write!(f, "{}", n),
            Timestamp::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Timestamp::Number(value.into())
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

/// Response envelope of the dashboard endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub timestamp: Option<Timestamp>,
    pub projects: Option<Vec<RawProject>>,
    pub status_counts: Option<BTreeMap<String, i64>>,
    pub task_status_counts: Option<BTreeMap<String, i64>>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl SnapshotResponse {
    /// Validate the envelope and normalize it into a `Snapshot`
    pub fn into_snapshot(self) -> Result<Snapshot, SyncError> {
        if !self.success {
            let message = self
                .message
                .or(self.error)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(SyncError::rejected(message));
        }

        let timestamp = self
            .timestamp
            .ok_or_else(|| SyncError::malformed("missing timestamp"))?;

        let mut rejected = 0;
        let mut seen = HashSet::new();
        let mut projects = Vec::new();
        for raw in self.projects.unwrap_or_default() {
            match raw.normalize() {
                Some(project) if seen.insert(project.id.clone()) => projects.push(project),
                Some(project) => {
                    tracing::warn!("Dropping duplicate project id {}", project.id);
                    rejected += 1;
                }
                None => {
                    tracing::warn!("Dropping project record without identity");
                    rejected += 1;
                }
            }
        }

        Ok(Snapshot {
            timestamp,
            projects,
            status_counts: normalize_status_counts(self.status_counts.unwrap_or_default()),
            task_status_counts: self.task_status_counts.unwrap_or_default(),
            rejected,
        })
    }
}

/// Normalized dashboard state at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    /// Display order is preserved; diffing is by id
    pub projects: Vec<Project>,
    /// Status code (`PL`, `OG`, `CP`, `CN`) to project count
    pub status_counts: BTreeMap<String, i64>,
    /// Task metric (`total`, `completed`, ...) to count
    pub task_status_counts: BTreeMap<String, i64>,
    /// Records dropped during normalization
    pub rejected: usize,
}

impl Snapshot {
    pub fn new(timestamp: impl Into<Timestamp>, projects: Vec<Project>) -> Self {
        Self {
            timestamp: timestamp.into(),
            projects,
            status_counts: BTreeMap::new(),
            task_status_counts: BTreeMap::new(),
            rejected: 0,
        }
    }

    /// Parse and normalize a raw endpoint body
    pub fn from_json(body: &str) -> Result<Self, SyncError> {
        let response: SnapshotResponse = serde_json::from_str(body)?;
        response.into_snapshot()
    }

    pub fn with_status_counts<K: Into<String>>(
        mut self,
        counts: impl IntoIterator<Item = (K, i64)>,
    ) -> Self {
        self.status_counts = normalize_status_counts(
            counts.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        );
        self
    }

    pub fn with_task_counts<K: Into<String>>(
        mut self,
        counts: impl IntoIterator<Item = (K, i64)>,
    ) -> Self {
        self.task_status_counts = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    pub fn project(&self, id: &RecordId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn project_ids(&self) -> HashSet<&RecordId> {
        self.projects.iter().map(|p| &p.id).collect()
    }

    pub fn index_by_id(&self) -> HashMap<&RecordId, &Project> {
        self.projects.iter().map(|p| (&p.id, p)).collect()
    }
}

fn normalize_status_counts(counts: BTreeMap<String, i64>) -> BTreeMap<String, i64> {
    counts
        .into_iter()
        .map(|(key, count)| match ProjectStatus::code_for_count_key(&key) {
            Some(code) => (code.to_string(), count),
            None => (key, count),
        })
        .collect()
}
