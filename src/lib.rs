//! PowerMason Dashboard - Main Library
//!
//! The dashboard sync engine of PowerMason, a construction project management
//! application. It polls the server's dashboard endpoint and keeps the
//! dashboard's counters, charts, task calendar and project map current by
//! pushing only what changed.
//!
//! # Overview
//!
//! This library provides:
//! - A poller with short retries, capped interval backoff and visibility and
//!   connectivity awareness
//! - Cheap, ordered change detection between snapshots
//! - A marker tracker that creates, moves, restyles, hides and re-shows map
//!   markers without ever duplicating or leaking one
//! - Delta application for counters, charts and the calendar
//!
//! # Module Structure
//!
//! - **`shared`** - Data model, configuration and error types
//!   - Project and snapshot wire shapes, normalized once at ingestion
//!   - Coordinate parsing
//!
//! - **`dashboard`** - The engine
//!   - `SyncService` poll loop and HTTP client
//!   - Reconciliation (change detection, markers, charts, counters, calendar)
//!   - Rendering backend traits and headless backends
//!
//! # Feature Flags
//!
//! - **`cli`** - Builds the `dashboard-sync` binary (logging subscriber, `.env`)
//!
//! # Usage
//!
//! ```rust
//! use powermason_dashboard::dashboard::context::DashboardContext;
//! use powermason_dashboard::dashboard::render::{headless::HeadlessMap, Surfaces};
//! use powermason_dashboard::shared::Snapshot;
//!
//! let body = r#"{ "success": true, "timestamp": 1,
//!     "projects": [ { "id": 1, "name": "Bridge", "status": "PL", "gps_coordinates": "14.5,120.9" } ] }"#;
//!
//! let map = HeadlessMap::new();
//! let mut context = DashboardContext::new(Surfaces::new().with_map(map.clone()));
//! context.apply(Snapshot::from_json(body).unwrap());
//! assert_eq!(map.attached_count(), 1);
//! ```
//!
//! # Thread Safety
//!
//! - Rendering surfaces are `Send` and owned by one `DashboardContext`
//! - The context sits behind a `tokio::sync::Mutex`; only one reconciliation
//!   runs at a time
//! - Poller state uses `tokio::sync::RwLock` and atomics
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations
//! - Custom error types in `shared::error` and `shared::config`
//! - Poll failures end at the sync service and only change the connection status

/// Shared types and data structures
pub mod shared;

/// Dashboard sync engine
pub mod dashboard;
