//! Per-instance runtime state shared between the poll task and readers.

use parking_lot::RwLock;
use statuswatch_adapters::{ErrorCategory, FetchError};
use statuswatch_types::StatusSnapshot;
use tracing::{debug, warn};

use super::RefreshInterval;
use crate::data::History;
use crate::instance::InstanceId;

/// Lifecycle phase of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No timer running.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    /// At least one fetch has succeeded.
    Ready,
    /// A failure is being surfaced to the user.
    Error,
}

impl Phase {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Error => "error",
        }
    }
}

/// What caused a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A regular timer tick.
    Scheduled,
    /// An explicit user request (pull-to-refresh, retry).
    Manual,
}

/// A fetch failure as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&FetchError> for FetchFailure {
    fn from(err: &FetchError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) history: History,
    pub(crate) phase: Phase,
    pub(crate) interval: RefreshInterval,
    pub(crate) last_error: Option<FetchFailure>,
    pub(crate) has_succeeded: bool,
    /// Bumped on every start and stop. A poll task only records results
    /// while the generation it was spawned with is still current.
    pub(crate) generation: u64,
}

/// State for one instance. History and status live behind a single lock so
/// readers always see a consistent pair.
#[derive(Debug)]
pub(crate) struct InstanceState {
    pub(crate) id: InstanceId,
    pub(crate) inner: RwLock<Inner>,
}

impl InstanceState {
    pub(crate) fn new(id: InstanceId, capacity: usize, interval: RefreshInterval) -> Self {
        Self {
            id,
            inner: RwLock::new(Inner {
                history: History::new(capacity),
                phase: Phase::Idle,
                interval,
                last_error: None,
                has_succeeded: false,
                generation: 0,
            }),
        }
    }

    /// Mark the instance as running at the given interval.
    ///
    /// Returns the generation the new poll task must record under.
    pub(crate) fn mark_started(&self, interval: RefreshInterval) -> u64 {
        let mut inner = self.inner.write();
        inner.interval = interval;
        inner.generation += 1;
        if !inner.has_succeeded {
            inner.phase = Phase::Loading;
            inner.last_error = None;
        } else if inner.phase != Phase::Error {
            inner.phase = Phase::Ready;
            inner.last_error = None;
        }
        inner.generation
    }

    /// Mark the instance as stopped. Results from any task still finishing
    /// a fetch are discarded from here on.
    pub(crate) fn mark_stopped(&self) {
        let mut inner = self.inner.write();
        inner.generation += 1;
        inner.phase = Phase::Idle;
        inner.last_error = None;
    }

    pub(crate) fn set_interval(&self, interval: RefreshInterval) {
        self.inner.write().interval = interval;
    }

    /// Apply the outcome of one fetch cycle.
    ///
    /// Success appends to history and clears any error. A failure is
    /// surfaced (phase `Error`) when nothing has ever succeeded or when the
    /// fetch was requested by the user; otherwise it is swallowed and the
    /// last good snapshot stays current.
    ///
    /// Results carrying a stale `generation` come from a task that has been
    /// stopped or replaced and are dropped.
    pub(crate) fn record(
        &self,
        result: Result<StatusSnapshot, FetchError>,
        trigger: Trigger,
        generation: u64,
    ) {
        let mut inner = self.inner.write();
        if inner.generation != generation {
            debug!("Dropping result from a cancelled poll task for {}", self.id);
            return;
        }
        match result {
            Ok(snapshot) => {
                inner.history.append(snapshot);
                inner.phase = Phase::Ready;
                inner.last_error = None;
                inner.has_succeeded = true;
                debug!(
                    "Fetched status for {} ({} snapshots retained)",
                    self.id,
                    inner.history.len()
                );
            }
            Err(err) if !inner.has_succeeded || trigger == Trigger::Manual => {
                warn!("Fetch failed for {}: {}", self.id, err);
                inner.phase = Phase::Error;
                inner.last_error = Some(FetchFailure::from(&err));
            }
            Err(err) => {
                debug!("Background fetch failed for {}, keeping last snapshot: {}", self.id, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (InstanceState, u64) {
        let state = InstanceState::new(InstanceId::from("nas"), 5, RefreshInterval::OneSecond);
        let generation = state.mark_started(RefreshInterval::OneSecond);
        (state, generation)
    }

    fn ok(ts: u64) -> Result<StatusSnapshot, FetchError> {
        Ok(StatusSnapshot::with_timestamp(ts))
    }

    #[test]
    fn test_initial_phase_is_idle() {
        let state = InstanceState::new(InstanceId::from("nas"), 5, RefreshInterval::OneSecond);
        assert_eq!(state.inner.read().phase, Phase::Idle);
    }

    #[test]
    fn test_started_without_data_is_loading() {
        let state = InstanceState::new(InstanceId::from("nas"), 5, RefreshInterval::OneSecond);
        state.mark_started(RefreshInterval::FiveSeconds);
        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Loading);
        assert_eq!(inner.interval, RefreshInterval::FiveSeconds);
    }

    #[test]
    fn test_first_failure_is_surfaced() {
        let (state, generation) = started();
        state.record(Err(FetchError::Timeout), Trigger::Scheduled, generation);

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Error);
        assert_eq!(
            inner.last_error.as_ref().map(|e| e.category),
            Some(ErrorCategory::Transport)
        );
    }

    #[test]
    fn test_background_failure_after_success_is_swallowed() {
        let (state, generation) = started();
        state.record(ok(1), Trigger::Scheduled, generation);
        state.record(Err(FetchError::Decode("bad".into())), Trigger::Scheduled, generation);

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Ready);
        assert!(inner.last_error.is_none());
        assert_eq!(inner.history.current().unwrap().captured_at_ms, 1);
    }

    #[test]
    fn test_manual_failure_is_surfaced_and_keeps_history() {
        let (state, generation) = started();
        state.record(ok(1), Trigger::Scheduled, generation);
        state.record(Err(FetchError::Timeout), Trigger::Manual, generation);

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Error);
        assert_eq!(inner.history.len(), 1);
    }

    #[test]
    fn test_success_clears_error() {
        let (state, generation) = started();
        state.record(Err(FetchError::Timeout), Trigger::Scheduled, generation);
        state.record(ok(2), Trigger::Scheduled, generation);

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Ready);
        assert!(inner.last_error.is_none());
    }

    #[test]
    fn test_stop_clears_error() {
        let (state, generation) = started();
        state.record(Err(FetchError::Timeout), Trigger::Scheduled, generation);
        state.mark_stopped();

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Idle);
        assert!(inner.last_error.is_none());
    }

    #[test]
    fn test_restart_without_data_clears_error() {
        let (state, generation) = started();
        state.record(Err(FetchError::Timeout), Trigger::Scheduled, generation);
        assert_eq!(state.inner.read().phase, Phase::Error);

        state.mark_started(RefreshInterval::TwoSeconds);
        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Loading);
        assert!(inner.last_error.is_none());
    }

    #[test]
    fn test_restart_after_stop_with_data_is_ready() {
        let (state, generation) = started();
        state.record(ok(1), Trigger::Scheduled, generation);
        state.record(Err(FetchError::Timeout), Trigger::Manual, generation);
        state.mark_stopped();

        state.mark_started(RefreshInterval::TwoSeconds);
        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Ready);
        assert!(inner.last_error.is_none());
    }

    #[test]
    fn test_result_after_stop_is_dropped() {
        let (state, generation) = started();
        state.mark_stopped();
        state.record(ok(1), Trigger::Scheduled, generation);

        let inner = state.inner.read();
        assert_eq!(inner.phase, Phase::Idle);
        assert!(inner.history.is_empty());
    }

    #[test]
    fn test_result_from_replaced_task_is_dropped() {
        let (state, old) = started();
        let new = state.mark_started(RefreshInterval::FiveSeconds);
        assert_ne!(old, new);

        state.record(ok(1), Trigger::Scheduled, old);
        assert!(state.inner.read().history.is_empty());

        state.record(ok(2), Trigger::Scheduled, new);
        assert_eq!(state.inner.read().history.len(), 1);
    }
}
