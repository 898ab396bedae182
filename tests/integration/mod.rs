//! Integration tests
//!
//! Exercise the engine end to end: the HTTP client against a mock endpoint,
//! the sync service driving a full dashboard, and multi-snapshot
//! reconciliation scenarios.

pub mod http_client_test;
pub mod poller_test;
pub mod reconcile_scenarios_test;
