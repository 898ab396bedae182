//! # Retry Logic and Backoff
//!
//! Decides what the poller does after a failed fetch.
//!
//! ## Strategy
//!
//! - **Short retries**: while the consecutive failure count is below
//!   `max_retries`, one extra fetch is scheduled after a fixed delay
//! - **Backoff**: from `max_retries` failures on, the poll interval is
//!   multiplied by `backoff_factor` (capped at `max_interval`) and the timer is
//!   restarted at the new period
//! - **Recovery**: the first success clears the failure count and restores the
//!   base interval
//!
//! ## Usage
//!
//! ```rust
//! use powermason_dashboard::dashboard::sync::retry::{FailureAction, RetryPolicy, RetryState};
//! use std::time::Duration;
//!
//! let mut retry = RetryState::new(RetryPolicy::default(), Duration::from_secs(30));
//! assert_eq!(
//!     retry.record_failure(),
//!     FailureAction::RetryAfter { attempt: 1, delay: Duration::from_secs(5) }
//! );
//! ```

use crate::shared::AppConfig;
use std::time::Duration;

/// Retry and backoff parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Failures answered with a short retry before backing off
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            backoff_factor: 1.5,
            max_interval: Duration::from_secs(120),
        }
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            backoff_factor: config.backoff_factor,
            max_interval: config.max_interval(),
        }
    }
}

/// What to do after a failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureAction {
    /// Fetch once more after `delay`
    RetryAfter { attempt: u32, delay: Duration },
    /// Keep polling, but at the longer `interval`
    BackOff { interval: Duration },
}

/// Failure counter and current poll interval
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    base_interval: Duration,
    interval: Duration,
    failures: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy, base_interval: Duration) -> Self {
        Self {
            policy,
            base_interval,
            interval: base_interval,
            failures: 0,
        }
    }

    /// Start over with a new base interval
    pub fn reset(&mut self, base_interval: Duration) {
        self.base_interval = base_interval;
        self.interval = base_interval;
        self.failures = 0;
    }

    pub fn record_failure(&mut self) -> FailureAction {
        self.failures = self.failures.saturating_add(1);

        if self.failures < self.policy.max_retries {
            return FailureAction::RetryAfter {
                attempt: self.failures,
                delay: self.policy.retry_delay,
            };
        }

        let ceiling = self.policy.max_interval.max(self.base_interval);
        self.interval = self.interval.mul_f64(self.policy.backoff_factor).min(ceiling);
        tracing::warn!(
            "{} consecutive failures, polling every {:?}",
            self.failures,
            self.interval
        );
        FailureAction::BackOff {
            interval: self.interval,
        }
    }

    /// Clear the failure count. Returns true if the interval was restored.
    pub fn record_success(&mut self) -> bool {
        self.failures = 0;
        if self.interval != self.base_interval {
            tracing::info!("Refresh recovered, polling every {:?} again", self.base_interval);
            self.interval = self.base_interval;
            return true;
        }
        false
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}
