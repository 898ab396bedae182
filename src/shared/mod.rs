//! Shared Module
//!
//! This module contains the data model of the dashboard endpoint and the
//! cross-cutting pieces every other module depends on.
//!
//! # Overview
//!
//! - `project` / `snapshot` - wire shapes and their normalized forms
//! - `geo` - `"lat,lng"` parsing
//! - `error` - error taxonomy
//! - `config` - engine configuration

/// Project records and normalization
pub mod project;

/// Snapshot envelope and normalized snapshot
pub mod snapshot;

/// Coordinate parsing
pub mod geo;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{CoordinateError, RenderError, SyncError};
pub use geo::Coordinates;
pub use project::{BudgetTotal, Project, ProjectStatus, RecordId, Task};
pub use snapshot::{Snapshot, SnapshotResponse, Timestamp};
