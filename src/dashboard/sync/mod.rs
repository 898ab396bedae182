//! # Dashboard Sync Service
//!
//! Keeps the dashboard current by polling the snapshot endpoint and handing
//! every successful result to the [`DashboardContext`].
//!
//! ## Architecture
//!
//! The service coordinates a few small components:
//! - **Poll loop**: one tokio task multiplexing the interval timer, the
//!   pending short retry and a command channel
//! - **Retry**: failure counting, short retries and interval backoff
//! - **Network Monitor**: visibility and connectivity signals
//! - **Sync State**: connection status for the indicator
//! - **Metrics**: poll counters and timing
//!
//! ## Guarantees
//!
//! - At most one fetch is in flight. A guard flag is held from the start of
//!   the fetch until reconciliation has finished.
//! - A fetch that completes after [`SyncService::stop`] or a restart is
//!   discarded (generation check).
//! - A forced poll (start, visible, online, resume, manual) that finds a
//!   fetch in flight is replayed once on the current poll task when that
//!   fetch finishes.
//! - Failures never reach the caller and never clear the dashboard; they only
//!   change the connection status.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use powermason_dashboard::dashboard::client::HttpSnapshotClient;
//! use powermason_dashboard::dashboard::context::DashboardContext;
//! use powermason_dashboard::dashboard::render::{LogIndicator, Surfaces};
//! use powermason_dashboard::dashboard::sync::{SyncConfig, SyncService};
//! use powermason_dashboard::shared::AppConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let app = AppConfig::builder().token("secret").role("PM").build()?;
//! let source = Arc::new(HttpSnapshotClient::new(&app)?);
//! let context = DashboardContext::new(Surfaces::new());
//!
//! let config = SyncConfig::from(&app);
//! let interval = config.poll_interval;
//! let mut service = SyncService::new(config, source, context, Arc::new(LogIndicator));
//! service.start(interval).await;
//!
//! // Tab hidden, then shown again: the second call fetches immediately
//! service.set_visibility(false).await;
//! service.set_visibility(true).await;
//!
//! println!("Sync status: {}", service.status().await);
//! service.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod network_monitor;
pub mod retry;
pub mod sync_state;

use crate::dashboard::client::SnapshotSource;
use crate::dashboard::context::{DashboardContext, ReconcileOutcome, RenderReport};
use crate::dashboard::reconcile::Change;
use crate::dashboard::render::StatusIndicator;
use crate::shared::{AppConfig, SyncError};
use metrics::SyncMetrics;
use network_monitor::NetworkMonitor;
use retry::{FailureAction, RetryPolicy, RetryState};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use sync_state::{ConnectionStatus, SyncState};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Configuration for the sync service
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base poll interval
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AppConfig> for SyncConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            retry: RetryPolicy::from(config),
        }
    }
}

/// Why a poll did not fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    Offline,
    /// Stopped or paused
    Inactive,
    /// Another fetch has not finished yet
    InFlight,
}

/// Result of one poll attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Skipped(SkipReason),
    /// Fetched, but nothing relevant changed
    Unchanged,
    Applied { change: Change, report: RenderReport },
    /// Fetched after a stop or restart; result dropped
    Discarded,
    Failed { error: SyncError, action: FailureAction },
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Unchanged | PollOutcome::Applied { .. })
    }

    fn schedule(&self) -> Option<Schedule> {
        match self {
            PollOutcome::Unchanged | PollOutcome::Applied { .. } => Some(Schedule::Base),
            PollOutcome::Failed { action: FailureAction::RetryAfter { delay, .. }, .. } => {
                Some(Schedule::Retry(*delay))
            }
            PollOutcome::Failed { action: FailureAction::BackOff { interval }, .. } => {
                Some(Schedule::Interval(*interval))
            }
            PollOutcome::Skipped(_) | PollOutcome::Discarded => None,
        }
    }
}

/// What started a poll. Each trigger has its own gating rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// First tick of a run: same rules as the timer
    Start,
    /// Interval tick: needs running, unpaused, visible and online
    Timer,
    /// Short retry after a failure: same rules as the timer
    Retry,
    /// Became visible: needs running and unpaused
    Visible,
    /// Connectivity returned: needs running
    Online,
    /// Resumed after a pause: needs running
    Resume,
    /// Replays a forced poll that found a fetch in flight: needs running
    Deferred,
    /// Explicit refresh: always fetches
    Manual,
}

impl Trigger {
    /// Forced polls are owed a fetch even when another one is in flight
    fn is_forced(self) -> bool {
        matches!(
            self,
            Trigger::Start | Trigger::Visible | Trigger::Online | Trigger::Resume | Trigger::Manual
        )
    }
}

/// Timer adjustment requested by a poll result
#[derive(Debug, Clone, Copy, PartialEq)]
enum Schedule {
    /// Cancel any pending retry and poll at the base interval
    Base,
    Retry(Duration),
    Interval(Duration),
}

#[derive(Debug)]
enum Command {
    Poll(Trigger),
    Reschedule(Schedule),
}

/// Releases the in-flight flag on drop
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// State shared between the service handle and its poll task
struct Inner {
    source: Arc<dyn SnapshotSource>,
    context: Arc<Mutex<DashboardContext>>,
    indicator: Arc<dyn StatusIndicator>,
    state: RwLock<SyncState>,
    metrics: RwLock<SyncMetrics>,
    retry: Mutex<RetryState>,
    monitor: NetworkMonitor,
    in_flight: AtomicBool,
    /// A forced poll was skipped while a fetch was in flight
    deferred: AtomicBool,
    /// Command channel of the current poll task
    commands: std::sync::Mutex<Option<mpsc::UnboundedSender<Command>>>,
    running: AtomicBool,
    paused: AtomicBool,
    generation: AtomicU64,
}

impl Inner {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn gate(&self, trigger: Trigger) -> Option<SkipReason> {
        let running = self.running.load(Ordering::Acquire);
        let active = running && !self.paused.load(Ordering::Acquire);
        match trigger {
            Trigger::Start | Trigger::Timer | Trigger::Retry | Trigger::Visible if !active => {
                Some(SkipReason::Inactive)
            }
            Trigger::Start | Trigger::Timer | Trigger::Retry if !self.monitor.is_visible() => {
                Some(SkipReason::Hidden)
            }
            Trigger::Start | Trigger::Timer | Trigger::Retry if !self.monitor.is_online() => {
                Some(SkipReason::Offline)
            }
            Trigger::Online | Trigger::Resume | Trigger::Deferred if !running => {
                Some(SkipReason::Inactive)
            }
            _ => None,
        }
    }

    fn send(&self, command: Command) {
        let commands = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(commands) = commands.as_ref() {
            if commands.send(command).is_err() {
                tracing::debug!("Poll task already finished");
            }
        }
    }

    fn set_commands(&self, commands: Option<mpsc::UnboundedSender<Command>>) {
        *self.commands.lock().unwrap_or_else(PoisonError::into_inner) = commands;
    }

    fn defer_refresh(&self) {
        self.deferred.store(true, Ordering::SeqCst);
        // The fetch may have finished between the failed acquire and the store
        if !self.in_flight.load(Ordering::SeqCst) {
            self.replay_deferred();
        }
    }

    /// Hand a deferred refresh to the current poll task
    fn replay_deferred(&self) {
        if self.deferred.swap(false, Ordering::SeqCst) {
            tracing::debug!("Replaying refresh skipped during the previous fetch");
            self.send(Command::Poll(Trigger::Deferred));
        }
    }

    async fn poll(&self, trigger: Trigger) -> PollOutcome {
        if let Some(reason) = self.gate(trigger) {
            tracing::trace!("Skipping {:?} poll: {:?}", trigger, reason);
            self.metrics.write().await.record_skip();
            return PollOutcome::Skipped(reason);
        }

        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Skipping {:?} poll: fetch already in flight", trigger);
            self.metrics.write().await.record_skip();
            if trigger.is_forced() {
                self.defer_refresh();
            }
            return PollOutcome::Skipped(SkipReason::InFlight);
        };

        let outcome = self.fetch_and_apply().await;
        drop(guard);
        self.replay_deferred();
        outcome
    }

    /// Fetch and reconcile. Caller holds the in-flight guard.
    async fn fetch_and_apply(&self) -> PollOutcome {
        let generation = self.generation();
        self.metrics.write().await.record_poll_start();
        let result = self.source.fetch().await;

        if self.generation() != generation {
            tracing::debug!("Discarding snapshot fetched before stop/restart");
            self.metrics.write().await.record_discarded();
            return PollOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => {
                if snapshot.rejected > 0 {
                    tracing::warn!("Snapshot contained {} unusable project records", snapshot.rejected);
                }
                let outcome = self.context.lock().await.apply(snapshot);
                let interval = {
                    let mut retry = self.retry.lock().await;
                    retry.record_success();
                    retry.interval()
                };

                let applied = matches!(outcome, ReconcileOutcome::Applied { .. });
                self.metrics.write().await.record_poll_success(applied);

                {
                    let mut state = self.state.write().await;
                    state.last_sync = Some(chrono::Utc::now().to_rfc3339());
                    state.consecutive_failures = 0;
                    state.interval = interval;
                    state.last_error = None;
                    if let ReconcileOutcome::Applied { change, .. } = &outcome {
                        state.last_change = Some(change.to_string());
                    }
                }
                self.refresh_status().await;

                match outcome {
                    ReconcileOutcome::Unchanged => PollOutcome::Unchanged,
                    ReconcileOutcome::Applied { change, report } => {
                        tracing::info!("Dashboard updated: {}", report);
                        PollOutcome::Applied { change, report }
                    }
                }
            }
            Err(error) => {
                tracing::warn!("Dashboard refresh failed: {}", error);
                let (action, failures, max, interval) = {
                    let mut retry = self.retry.lock().await;
                    let action = retry.record_failure();
                    (action, retry.failures(), retry.policy().max_retries, retry.interval())
                };
                self.metrics.write().await.record_poll_failure();

                let status = if !self.monitor.is_online() {
                    ConnectionStatus::Offline
                } else {
                    match action {
                        FailureAction::RetryAfter { attempt, .. } => {
                            ConnectionStatus::Retrying { attempt, max }
                        }
                        FailureAction::BackOff { .. } => ConnectionStatus::Degraded,
                    }
                };
                {
                    let mut state = self.state.write().await;
                    state.consecutive_failures = failures;
                    state.interval = interval;
                    state.last_error = Some(error.to_string());
                }
                if self.running.load(Ordering::Acquire) {
                    self.set_status(status).await;
                }

                PollOutcome::Failed { error, action }
            }
        }
    }

    /// Status implied by the run flags and connectivity
    async fn refresh_status(&self) {
        let status = if !self.running.load(Ordering::Acquire) {
            ConnectionStatus::Stopped
        } else if self.paused.load(Ordering::Acquire) {
            ConnectionStatus::Paused
        } else if !self.monitor.is_online() {
            ConnectionStatus::Offline
        } else {
            ConnectionStatus::Active
        };
        self.set_status(status).await;
    }

    async fn set_status(&self, status: ConnectionStatus) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.status != status;
            state.status = status;
            changed
        };
        if changed {
            self.indicator.show(&status);
        }
    }
}

/// Dashboard poller
pub struct SyncService {
    config: SyncConfig,
    inner: Arc<Inner>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl SyncService {
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn SnapshotSource>,
        context: DashboardContext,
        indicator: Arc<dyn StatusIndicator>,
    ) -> Self {
        let retry = RetryState::new(config.retry.clone(), config.poll_interval);
        let state = SyncState {
            interval: config.poll_interval,
            ..SyncState::default()
        };
        let inner = Arc::new(Inner {
            source,
            context: Arc::new(Mutex::new(context)),
            indicator,
            state: RwLock::new(state),
            metrics: RwLock::new(SyncMetrics::new()),
            retry: Mutex::new(retry),
            monitor: NetworkMonitor::new(),
            in_flight: AtomicBool::new(false),
            deferred: AtomicBool::new(false),
            commands: std::sync::Mutex::new(None),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        });

        Self {
            config,
            inner,
            task: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start polling every `interval`, with an immediate first fetch.
    ///
    /// Calling `start` on a running service restarts it.
    pub async fn start(&mut self, interval: Duration) {
        if self.task.is_some() {
            tracing::info!("Restarting dashboard sync");
            self.halt();
        }

        self.inner.retry.lock().await.reset(interval);
        self.inner.state.write().await.interval = interval;
        self.inner.paused.store(false, Ordering::Release);
        self.inner.running.store(true, Ordering::Release);
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let (commands, receiver) = mpsc::unbounded_channel();
        self.inner.set_commands(Some(commands));
        let inner = Arc::clone(&self.inner);
        self.task = Some(tokio::spawn(async move {
            poll_loop(inner, generation, interval, receiver).await;
        }));

        tracing::info!("Dashboard sync started ({:?} interval)", interval);
        self.inner.refresh_status().await;
    }

    /// Stop polling. Safe to call at any time, any number of times.
    ///
    /// A fetch still in flight completes but its result is discarded.
    pub async fn stop(&mut self) {
        if self.halt() {
            tracing::info!("Dashboard sync stopped");
        }
        self.inner.set_status(ConnectionStatus::Stopped).await;
    }

    /// Invalidate the current poll task. Returns false if none was running.
    fn halt(&mut self) -> bool {
        self.inner.running.store(false, Ordering::Release);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        // Dropping the sender ends the loop once it is idle
        self.inner.set_commands(None);
        self.task.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Poll once under the timer's rules
    pub async fn tick(&self) -> PollOutcome {
        let outcome = self.inner.poll(Trigger::Timer).await;
        self.reschedule(&outcome);
        outcome
    }

    /// Fetch now, regardless of visibility, pause or connectivity
    pub async fn force_refresh(&self) -> PollOutcome {
        tracing::info!("Manual dashboard refresh");
        let outcome = self.inner.poll(Trigger::Manual).await;
        self.reschedule(&outcome);
        outcome
    }

    /// Suspend timer polling without stopping the service
    pub async fn pause(&self) {
        if !self.inner.paused.swap(true, Ordering::AcqRel) {
            tracing::info!("Dashboard sync paused");
        }
        self.inner.refresh_status().await;
    }

    /// Resume timer polling and fetch immediately
    pub async fn resume(&self) {
        if self.inner.paused.swap(false, Ordering::AcqRel) {
            tracing::info!("Dashboard sync resumed");
            self.inner.send(Command::Poll(Trigger::Resume));
        }
        self.inner.refresh_status().await;
    }

    /// Report a visibility change. Becoming visible fetches immediately.
    pub async fn set_visibility(&self, visible: bool) {
        let was_visible = self.inner.monitor.set_visible(visible);
        if visible && !was_visible {
            tracing::debug!("Dashboard visible again, refreshing");
            self.inner.send(Command::Poll(Trigger::Visible));
        }
    }

    /// Report a connectivity change. Coming back online fetches immediately.
    pub async fn set_online(&self, online: bool) {
        let was_online = self.inner.monitor.set_online(online);
        match (was_online, online) {
            (false, true) => {
                tracing::info!("Back online, refreshing dashboard");
                self.inner.send(Command::Poll(Trigger::Online));
            }
            (true, false) => tracing::warn!("Connection lost, pausing refresh"),
            _ => {}
        }
        self.inner.refresh_status().await;
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.state.read().await.status
    }

    pub async fn state(&self) -> SyncState {
        self.inner.state.read().await.clone()
    }

    pub async fn metrics(&self) -> SyncMetrics {
        self.inner.metrics.read().await.clone()
    }

    /// The context every poll reconciles into
    pub fn context(&self) -> Arc<Mutex<DashboardContext>> {
        Arc::clone(&self.inner.context)
    }

    fn reschedule(&self, outcome: &PollOutcome) {
        if let Some(schedule) = outcome.schedule() {
            self.inner.send(Command::Reschedule(schedule));
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.halt();
    }
}

fn ticker(period: Duration, start: Instant) -> Interval {
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn poll_loop(
    inner: Arc<Inner>,
    generation: u64,
    base: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut period = base;
    let mut timer = ticker(period, Instant::now());
    let mut retry_at: Option<Instant> = None;
    let mut tick_trigger = Trigger::Start;

    loop {
        if inner.generation() != generation {
            break;
        }

        let schedule = tokio::select! {
            _ = timer.tick() => {
                let trigger = std::mem::replace(&mut tick_trigger, Trigger::Timer);
                inner.poll(trigger).await.schedule()
            }
            _ = wait_until(retry_at) => {
                retry_at = None;
                inner.poll(Trigger::Retry).await.schedule()
            }
            command = commands.recv() => match command {
                Some(Command::Poll(trigger)) => inner.poll(trigger).await.schedule(),
                Some(Command::Reschedule(schedule)) => Some(schedule),
                None => break,
            },
        };

        let next = match schedule {
            None => continue,
            Some(Schedule::Retry(delay)) => {
                retry_at = Some(Instant::now() + delay);
                continue;
            }
            Some(Schedule::Base) => base,
            Some(Schedule::Interval(interval)) => interval,
        };

        retry_at = None;
        if next != period {
            period = next;
            timer = ticker(period, Instant::now() + period);
            tracing::debug!("Poll interval now {:?}", period);
        }
    }

    tracing::debug!("Poll task {} exited", generation);
}
