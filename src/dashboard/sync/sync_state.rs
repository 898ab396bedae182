//! # Sync State
//!
//! Connection status shown by the dashboard indicator, plus the observable
//! state of the poller.

use std::fmt;
use std::time::Duration;

/// Human-readable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Active,
    /// A short retry is scheduled after `attempt` failures
    Retrying { attempt: u32, max: u32 },
    /// Repeated failures; polling at a backed-off interval
    Degraded,
    Offline,
    Paused,
    #[default]
    Stopped,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Active => f.write_str("active"),
            ConnectionStatus::Retrying { attempt, max } => write!(f, "retrying ({}/{})", attempt, max),
            ConnectionStatus::Degraded => f.write_str("degraded"),
            ConnectionStatus::Offline => f.write_str("offline"),
            ConnectionStatus::Paused => f.write_str("paused"),
            ConnectionStatus::Stopped => f.write_str("stopped"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub status: ConnectionStatus,
    /// RFC 3339 time of the last successful fetch
    pub last_sync: Option<String>,
    pub consecutive_failures: u32,
    /// Current poll period
    pub interval: Duration,
    pub last_error: Option<String>,
    /// Why the last applied snapshot was considered changed
    pub last_change: Option<String>,
}
