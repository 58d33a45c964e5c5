//! Rolling snapshot history and chart series derivation.

use std::collections::VecDeque;
use std::iter;

use statuswatch_types::StatusSnapshot;

/// Default chart window, in snapshots.
pub const DEFAULT_CAPACITY: usize = 30;

/// Fixed-capacity history of snapshots for one instance.
///
/// Snapshots are kept in append order, oldest first. Once the capacity is
/// reached, each append evicts the oldest snapshot.
///
/// The series helpers always return exactly `window` points (or
/// `window - 1` for deltas) so that charts keep a constant width while
/// history is still filling up.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<StatusSnapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` snapshots.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a new snapshot, evicting the oldest if full.
    pub fn append(&mut self, snapshot: StatusSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// The most recently appended snapshot.
    pub fn current(&self) -> Option<&StatusSnapshot> {
        self.snapshots.back()
    }

    /// The snapshot appended just before the current one.
    pub fn previous(&self) -> Option<&StatusSnapshot> {
        self.snapshots.len().checked_sub(2).and_then(|i| self.snapshots.get(i))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all recorded snapshots.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Iterate over snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StatusSnapshot> {
        self.snapshots.iter()
    }

    /// The most recent `window` snapshots, oldest first.
    fn recent(&self, window: usize) -> impl Iterator<Item = &StatusSnapshot> {
        let skip = self.snapshots.len().saturating_sub(window);
        self.snapshots.iter().skip(skip)
    }

    /// Extract a chart series of exactly `window` points.
    ///
    /// Points are ordered oldest to newest. When fewer than `window`
    /// snapshots exist the series is left-padded with `None`; when more
    /// exist only the most recent `window` are used.
    pub fn series<T, F>(&self, window: usize, extractor: F) -> Vec<Option<T>>
    where
        F: Fn(&StatusSnapshot) -> Option<T>,
    {
        let pad = window.saturating_sub(self.snapshots.len());
        iter::repeat_with(|| None)
            .take(pad)
            .chain(self.recent(window).map(extractor))
            .collect()
    }

    /// Successive differences of a cumulative counter over `window` snapshots.
    ///
    /// Returns exactly `window - 1` values, left-padded with zeros. Each value
    /// is the absolute difference between adjacent snapshots, so a counter
    /// reset never produces a negative rate. A pair where either side lacks
    /// the counter yields zero.
    pub fn delta<F>(&self, window: usize, extractor: F) -> Vec<u64>
    where
        F: Fn(&StatusSnapshot) -> Option<u64>,
    {
        let points = window.saturating_sub(1);
        let values: Vec<Option<u64>> = self.recent(window).map(extractor).collect();
        let diffs: Vec<u64> = values
            .windows(2)
            .map(|pair| match (pair[0], pair[1]) {
                (Some(prev), Some(next)) => next.abs_diff(prev),
                _ => 0,
            })
            .collect();

        let pad = points.saturating_sub(diffs.len());
        iter::repeat(0).take(pad).chain(diffs).collect()
    }

    /// Per-interval throughput in kilo-units (e.g. Kbit/s for bit counters).
    pub fn throughput<F>(&self, window: usize, extractor: F) -> Vec<f64>
    where
        F: Fn(&StatusSnapshot) -> Option<u64>,
    {
        self.delta(window, extractor)
            .into_iter()
            .map(|d| d as f64 / 1000.0)
            .collect()
    }

    /// Largest value of a field over the most recent `window` snapshots.
    pub fn window_max<F>(&self, window: usize, extractor: F) -> Option<f64>
    where
        F: Fn(&StatusSnapshot) -> Option<f64>,
    {
        self.recent(window)
            .filter_map(extractor)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Smallest value of a field over the most recent `window` snapshots.
    pub fn window_min<F>(&self, window: usize, extractor: F) -> Option<f64>
    where
        F: Fn(&StatusSnapshot) -> Option<f64>,
    {
        self.recent(window)
            .filter_map(extractor)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }
}
