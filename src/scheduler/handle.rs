//! Read-only handle to an instance's runtime state.

use std::sync::Arc;

use statuswatch_types::StatusSnapshot;

use super::state::{FetchFailure, InstanceState, Phase};
use super::RefreshInterval;
use crate::data::History;
use crate::instance::InstanceId;

/// A cheap, cloneable view of one instance for presentation code.
///
/// Every accessor takes the state lock once, so a reader sees the history
/// either before or after an append, never in between.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    pub(crate) state: Arc<InstanceState>,
}

impl InstanceHandle {
    pub(crate) fn new(state: Arc<InstanceState>) -> Self {
        Self { state }
    }

    pub fn id(&self) -> &InstanceId {
        &self.state.id
    }

    pub fn phase(&self) -> Phase {
        self.state.inner.read().phase
    }

    pub fn interval(&self) -> RefreshInterval {
        self.state.inner.read().interval
    }

    /// The surfaced failure, present only while the phase is `Error`.
    pub fn error(&self) -> Option<FetchFailure> {
        self.state.inner.read().last_error.clone()
    }

    /// The most recent snapshot.
    pub fn current(&self) -> Option<StatusSnapshot> {
        self.state.inner.read().history.current().cloned()
    }

    /// Number of snapshots retained.
    pub fn len(&self) -> usize {
        self.state.inner.read().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a closure against the history under the read lock.
    ///
    /// Use this for anything beyond the convenience accessors, e.g.
    /// computing several series from the same state.
    pub fn with_history<R>(&self, f: impl FnOnce(&History) -> R) -> R {
        f(&self.state.inner.read().history)
    }

    /// See [`History::series`].
    pub fn series<T, F>(&self, window: usize, extractor: F) -> Vec<Option<T>>
    where
        F: Fn(&StatusSnapshot) -> Option<T>,
    {
        self.with_history(|h| h.series(window, extractor))
    }

    /// See [`History::delta`].
    pub fn delta<F>(&self, window: usize, extractor: F) -> Vec<u64>
    where
        F: Fn(&StatusSnapshot) -> Option<u64>,
    {
        self.with_history(|h| h.delta(window, extractor))
    }
}
