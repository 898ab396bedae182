//! Dashboard Sync Engine
//!
//! Polls the PowerMason dashboard endpoint and keeps counters, charts, the
//! task calendar and the project map current with minimal updates.
//!
//! # Architecture
//!
//! - **`config`** - Environment-backed runtime configuration
//! - **`client`** - `SnapshotSource` trait and the HTTP client
//! - **`sync`** - The poller: timer, retries, backoff, connection status
//! - **`reconcile`** - Change detection and delta application
//! - **`render`** - Rendering backend traits and headless backends
//! - **`context`** - The object owning surfaces, tracker and last snapshot
//! - **`main`** - `dashboard-sync` binary
//!
//! # Module Structure
//!
//! ```text
//! dashboard/
//! ├── mod.rs
//! ├── main.rs          - dashboard-sync entry point
//! ├── config.rs
//! ├── client.rs
//! ├── context.rs
//! ├── sync/            - SyncService, retry, network monitor, state, metrics
//! ├── reconcile/       - change detector, marker tracker, chart/counter/calendar deltas
//! └── render/          - surface traits, headless backends
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! // Poll a live server and log every delta:
//! // DASHBOARD_TOKEN=... DASHBOARD_ROLE=PM cargo run --features cli --bin dashboard-sync
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod reconcile;
pub mod render;
pub mod sync;

pub use client::{HttpSnapshotClient, SnapshotSource};
pub use context::{DashboardContext, ReconcileOutcome, RenderReport};
pub use sync::{PollOutcome, SyncConfig, SyncService};
