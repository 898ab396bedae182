//! # Sync Metrics
//!
//! Poll counters and timing for the dashboard poller.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct SyncMetrics {
    /// Fetches started
    pub total_polls: u64,
    pub successful_polls: u64,
    pub failed_polls: u64,
    /// Successful polls that changed the dashboard
    pub applied_polls: u64,
    /// Fetches whose result arrived after a stop or restart
    pub discarded_polls: u64,
    /// Ticks that did not fetch (hidden, offline, paused, busy)
    pub skipped_ticks: u64,
    pub average_poll_duration: Duration,
    pub last_poll_duration: Option<Duration>,
    pub last_poll_start: Option<Instant>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll_start(&mut self) {
        self.last_poll_start = Some(Instant::now());
        self.total_polls += 1;
    }

    pub fn record_poll_success(&mut self, applied: bool) {
        if let Some(start) = self.last_poll_start.take() {
            let duration = start.elapsed();
            self.last_poll_duration = Some(duration);
            self.successful_polls += 1;

            // Update rolling average
            let successes = u32::try_from(self.successful_polls).unwrap_or(u32::MAX);
            let total = self.average_poll_duration * (successes - 1) + duration;
            self.average_poll_duration = total / successes;
        }
        if applied {
            self.applied_polls += 1;
        }
    }

    pub fn record_poll_failure(&mut self) {
        self.last_poll_start = None;
        self.failed_polls += 1;
    }

    pub fn record_discarded(&mut self) {
        self.last_poll_start = None;
        self.discarded_polls += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped_ticks += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_polls == 0 {
            0.0
        } else {
            self.successful_polls as f64 / self.total_polls as f64
        }
    }
}
