/**
 * Project Data Structures
 *
 * This module defines the project records carried by a dashboard snapshot.
 *
 * The server is loose about field names (`name` vs `project_name`, `id` vs
 * `project_id`, `progress` vs `actual_progress`). Records are therefore read
 * into `RawProject`, which accepts every variant, and normalized exactly once
 * into `Project`. Everything downstream of ingestion consumes `Project` only.
 */
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a project or task.
///
/// The server sends integers for database ids and strings for project codes,
/// so both forms are accepted. `Int(1)` and `Text("1")` are distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Text(id.to_string())
    }
}

/// Lifecycle status of a project
///
/// `OG` and `IP` are two spellings of the same state and both map to `Ongoing`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Planned,
    Ongoing,
    Completed,
    Cancelled,
    /// Any code outside the known set, kept verbatim
    Other(String),
}

impl ProjectStatus {
    /// Map a server status code onto a status
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "PL" => ProjectStatus::Planned,
            "OG" | "IP" => ProjectStatus::Ongoing,
            "CP" => ProjectStatus::Completed,
            "CN" => ProjectStatus::Cancelled,
            other => ProjectStatus::Other(other.to_string()),
        }
    }

    /// Map a status-count key (`PL` or `planned` style) onto a status code.
    ///
    /// Returns `None` for keys that name no known status.
    pub fn code_for_count_key(key: &str) -> Option<&'static str> {
        match key {
            "PL" | "planned" => Some("PL"),
            "OG" | "IP" | "ongoing" | "in_progress" => Some("OG"),
            "CP" | "completed" => Some("CP"),
            "CN" | "cancelled" => Some("CN"),
            _ => None,
        }
    }

    /// Canonical status code
    pub fn code(&self) -> &str {
        match self {
            ProjectStatus::Planned => "PL",
            ProjectStatus::Ongoing => "OG",
            ProjectStatus::Completed => "CP",
            ProjectStatus::Cancelled => "CN",
            ProjectStatus::Other(code) => code,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "Planned",
            ProjectStatus::Ongoing => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
            ProjectStatus::Other(_) => "Unknown",
        }
    }

    /// Marker fill color. Unknown codes fall back to the planned color.
    pub fn marker_color(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "#f97316",
            ProjectStatus::Completed => "#22c55e",
            ProjectStatus::Cancelled => "#ef4444",
            ProjectStatus::Planned | ProjectStatus::Other(_) => "#3b82f6",
        }
    }

    /// Marker glyph
    pub fn marker_icon(&self) -> &'static str {
        match self {
            ProjectStatus::Ongoing => "▶",
            ProjectStatus::Completed => "✓",
            ProjectStatus::Cancelled => "✕",
            ProjectStatus::Planned | ProjectStatus::Other(_) => "●",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Ongoing)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Budget figures shown in the budget chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetTotal {
    pub estimated: f64,
    pub approved: f64,
    pub planned: f64,
    pub allocated: f64,
    pub spent: f64,
}

/// Task record as sent by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTask {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub progress: Option<f64>,
    pub status: Option<String>,
    pub is_overdue: Option<bool>,
}

/// Normalized task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub progress: f64,
    pub status: String,
    pub is_overdue: bool,
}

impl RawTask {
    /// Normalize into a `Task`. Tasks without an id are dropped.
    pub fn normalize(self) -> Option<Task> {
        Some(Task {
            id: self.id?,
            title: non_empty(self.title).unwrap_or_else(|| "Untitled Task".to_string()),
            start: self.start.as_deref().and_then(parse_date),
            end: self.end.as_deref().and_then(parse_date),
            progress: self.progress.unwrap_or(0.0),
            status: self.status.unwrap_or_else(|| "pending".to_string()),
            is_overdue: self.is_overdue.unwrap_or(false),
        })
    }
}

/// Project record as sent by the server
///
/// Every field is optional. Fields this crate does not model are kept in
/// `extra` so callers can still watch them for changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProject {
    pub id: Option<RecordId>,
    pub project_id: Option<RecordId>,
    pub name: Option<String>,
    pub project_name: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub actual_progress: Option<f64>,
    pub planned_progress: Option<f64>,
    pub location: Option<String>,
    pub gps_coordinates: Option<String>,
    pub city_province: Option<String>,
    pub budget_total: Option<BudgetTotal>,
    pub tasks: Option<Vec<RawTask>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized project, the only shape used after ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// Diffing identity
    pub id: RecordId,
    pub name: String,
    pub status: ProjectStatus,
    /// Actual progress, 0..=100
    pub progress: f64,
    pub planned_progress: f64,
    pub location: String,
    /// Raw `"lat,lng"` string; `None` when absent or blank
    pub gps_coordinates: Option<String>,
    pub city_province: String,
    pub budget: BudgetTotal,
    pub tasks: Vec<Task>,
    pub extra: Map<String, Value>,
}

impl RawProject {
    /// Normalize into a `Project`.
    ///
    /// Returns `None` when no identity can be derived (no id, project id or name).
    pub fn normalize(self) -> Option<Project> {
        let name = non_empty(self.name.clone()).or_else(|| non_empty(self.project_name.clone()));
        let id = self
            .id
            .or(self.project_id)
            .or_else(|| name.clone().map(RecordId::Text))?;

        Some(Project {
            id,
            name: name.unwrap_or_else(|| "Unknown Project".to_string()),
            status: self
                .status
                .as_deref()
                .map(ProjectStatus::from_code)
                .unwrap_or_default(),
            progress: self.progress.or(self.actual_progress).unwrap_or(0.0),
            planned_progress: self.planned_progress.unwrap_or(0.0),
            location: self.location.unwrap_or_default(),
            gps_coordinates: non_empty(self.gps_coordinates),
            city_province: self.city_province.unwrap_or_default(),
            budget: self.budget_total.unwrap_or_default(),
            tasks: self
                .tasks
                .unwrap_or_default()
                .into_iter()
                .filter_map(RawTask::normalize)
                .collect(),
            extra: self.extra,
        })
    }
}

impl Project {
    /// Minimal project, mostly useful for building fixtures
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ProjectStatus::default(),
            progress: 0.0,
            planned_progress: 0.0,
            location: String::new(),
            gps_coordinates: None,
            city_province: String::new(),
            budget: BudgetTotal::default(),
            tasks: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_coordinates(mut self, gps: impl Into<String>) -> Self {
        self.gps_coordinates = non_empty(Some(gps.into()));
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Look up a field by its wire name for change detection.
    ///
    /// Modelled fields are reported in their normalized form; anything else is
    /// read from `extra`.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "id" => serde_json::to_value(&self.id).ok(),
            "name" | "project_name" => Some(Value::from(self.name.as_str())),
            "status" => Some(Value::from(self.status.code())),
            "progress" | "actual_progress" => Some(Value::from(self.progress)),
            "planned_progress" => Some(Value::from(self.planned_progress)),
            "location" => Some(Value::from(self.location.as_str())),
            "gps_coordinates" => self.gps_coordinates.as_deref().map(Value::from),
            "city_province" => Some(Value::from(self.city_province.as_str())),
            "budget_total" => serde_json::to_value(&self.budget).ok(),
            other => self.extra.get(other).cloned(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Accept plain dates as well as datetime strings by reading the date prefix
    let date = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
