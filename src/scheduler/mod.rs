//! Recurring status polling, one task per instance.
//!
//! The [`Scheduler`] owns a poll task for every started instance. Each task
//! fetches immediately, then once per [`RefreshInterval`], records the
//! outcome in the instance's state and also serves out-of-band refresh
//! requests without disturbing the timer's phase.
//!
//! ```text
//!  Scheduler::start ──▶ spawn ──▶ ┌──────────── poll task ────────────┐
//!                                 │ select! {                          │
//!                                 │   tick      => fetch (Scheduled)   │
//!  Scheduler::force_fetch ──mpsc─▶│   refresh   => fetch (Manual)      │
//!  Scheduler::stop ─────────watch▶│   stop      => break               │
//!                                 │ }                                  │
//!                                 └───────────────┬────────────────────┘
//!                                                 ▼
//!                                  InstanceState (history + phase)
//!                                                 ▲
//!                                  InstanceHandle (readers)
//! ```
//!
//! Changing the interval always cancels the running task before a new one
//! is spawned, so an instance never has two live timers.

mod handle;
mod interval;
mod state;

pub use handle::InstanceHandle;
pub use interval::{InvalidInterval, RefreshInterval};
pub use state::{FetchFailure, Phase, Trigger};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use statuswatch_adapters::FetchError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::data::DEFAULT_CAPACITY;
use crate::instance::InstanceId;
use crate::source::StatusSource;
use state::InstanceState;

/// Default bound on a single fetch, including any source-level timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Scheduler-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// History capacity for newly started instances.
    pub history_capacity: usize,
    /// Upper bound on a single fetch. Exceeding it counts as a timeout.
    pub fetch_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Owns the poll task of every started instance.
///
/// Methods that spawn tasks must be called from within a tokio runtime.
/// Dropping the scheduler cancels all tasks.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use statuswatch::{DemoSource, InstanceId, Phase, RefreshInterval, Scheduler};
///
/// # tokio_test::block_on(async {
/// let mut scheduler = Scheduler::new();
/// let handle = scheduler.start(
///     InstanceId::from("demo"),
///     Arc::new(DemoSource::new()),
///     RefreshInterval::OneSecond,
/// );
/// assert_ne!(handle.phase(), Phase::Idle);
///
/// scheduler.stop(&InstanceId::from("demo"));
/// assert_eq!(handle.phase(), Phase::Idle);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct Scheduler {
    options: SchedulerOptions,
    instances: HashMap<InstanceId, Entry>,
}

#[derive(Debug)]
struct Entry {
    source: Arc<dyn StatusSource>,
    state: Arc<InstanceState>,
    task: Option<PollTask>,
}

impl Scheduler {
    /// Create a scheduler with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with custom options.
    pub fn with_options(options: SchedulerOptions) -> Self {
        Self {
            options,
            instances: HashMap::new(),
        }
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Start polling an instance.
    ///
    /// If the instance is already running its task is cancelled and
    /// replaced; the history is kept. Fetches once immediately, then every
    /// `interval`.
    pub fn start(
        &mut self,
        id: InstanceId,
        source: Arc<dyn StatusSource>,
        interval: RefreshInterval,
    ) -> InstanceHandle {
        let options = self.options;
        let entry = self.instances.entry(id.clone()).or_insert_with(|| Entry {
            source: source.clone(),
            state: Arc::new(InstanceState::new(
                id.clone(),
                options.history_capacity,
                interval,
            )),
            task: None,
        });

        let restarted = entry.cancel();
        entry.source = source;
        let generation = entry.state.mark_started(interval);
        entry.task = Some(PollTask::spawn(
            entry.source.clone(),
            entry.state.clone(),
            generation,
            interval.as_duration(),
            options.fetch_timeout,
        ));

        if restarted {
            info!("Restarted polling for {} every {}", id, interval);
        } else {
            info!(
                "Started polling for {} ({}) every {}",
                id,
                entry.source.description(),
                interval
            );
        }

        InstanceHandle::new(entry.state.clone())
    }

    /// Change an instance's refresh interval.
    ///
    /// A running instance is restarted at the new cadence; a stopped one
    /// only records it. Returns `false` for an unknown instance.
    pub fn set_interval(&mut self, id: &InstanceId, interval: RefreshInterval) -> bool {
        let Some(entry) = self.instances.get(id) else {
            return false;
        };

        if entry.task.is_some() {
            let source = entry.source.clone();
            self.start(id.clone(), source, interval);
        } else {
            entry.state.set_interval(interval);
        }
        true
    }

    /// Request an immediate fetch outside the regular cadence.
    ///
    /// Failures of this fetch are always surfaced. Returns `false` if the
    /// instance is not running. Requests made while one is already pending
    /// are coalesced.
    pub fn force_fetch(&self, id: &InstanceId) -> bool {
        self.instances
            .get(id)
            .and_then(|entry| entry.task.as_ref())
            .map(PollTask::request_refresh)
            .unwrap_or(false)
    }

    /// Stop polling an instance, keeping its history. Idempotent.
    pub fn stop(&mut self, id: &InstanceId) -> bool {
        let Some(entry) = self.instances.get_mut(id) else {
            return false;
        };
        if entry.cancel() {
            info!("Stopped polling for {}", id);
        }
        entry.state.mark_stopped();
        true
    }

    /// Stop polling an instance and discard its history.
    pub fn remove(&mut self, id: &InstanceId) -> bool {
        let Some(mut entry) = self.instances.remove(id) else {
            return false;
        };
        entry.cancel();
        entry.state.mark_stopped();
        info!("Removed {}", id);
        true
    }

    /// Stop every running instance.
    pub fn stop_all(&mut self) {
        let ids: Vec<InstanceId> = self.instances.keys().cloned().collect();
        for id in ids {
            self.stop(&id);
        }
    }

    /// Handle to an instance's state, if it has been started.
    pub fn handle(&self, id: &InstanceId) -> Option<InstanceHandle> {
        self.instances
            .get(id)
            .map(|entry| InstanceHandle::new(entry.state.clone()))
    }

    pub fn is_running(&self, id: &InstanceId) -> bool {
        self.instances
            .get(id)
            .is_some_and(|entry| entry.task.is_some())
    }

    /// Number of live poll tasks across all instances.
    pub fn active_tasks(&self) -> usize {
        self.instances
            .values()
            .filter(|entry| entry.task.is_some())
            .count()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for entry in self.instances.values_mut() {
            entry.cancel();
        }
    }
}

impl Entry {
    /// Cancel the running task, if any. Returns whether one was running.
    fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.stop();
                true
            }
            None => false,
        }
    }
}

/// A spawned poll task and the channels that control it.
#[derive(Debug)]
struct PollTask {
    stop_tx: watch::Sender<bool>,
    refresh_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl PollTask {
    fn spawn(
        source: Arc<dyn StatusSource>,
        state: Arc<InstanceState>,
        generation: u64,
        interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (refresh_tx, mut refresh_rx) = mpsc::channel(1);

        let join = tokio::spawn(async move {
            // The first tick completes immediately.
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        fetch_cycle(source.as_ref(), &state, generation, fetch_timeout, Trigger::Scheduled).await;
                    }
                    Some(()) = refresh_rx.recv() => {
                        fetch_cycle(source.as_ref(), &state, generation, fetch_timeout, Trigger::Manual).await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            stop_tx,
            refresh_tx,
            join,
        }
    }

    fn request_refresh(&self) -> bool {
        match self.refresh_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    fn stop(self) {
        let _ = self.stop_tx.send(true);
        // Abort ends the loop at its next await. A fetch already past that
        // point is discarded by the generation check in `record`.
        self.join.abort();
    }
}

/// Run one fetch, bounded by `fetch_timeout`, and record the outcome.
async fn fetch_cycle(
    source: &dyn StatusSource,
    state: &InstanceState,
    generation: u64,
    fetch_timeout: Duration,
    trigger: Trigger,
) {
    let result = match tokio::time::timeout(fetch_timeout, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    };
    state.record(result, trigger, generation);
}
