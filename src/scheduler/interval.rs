//! Supported refresh intervals.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Returned when a refresh interval outside the supported set is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported refresh interval {0}s (expected one of 1, 2, 5, 10)")]
pub struct InvalidInterval(pub u64);

/// How often an instance is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "u64")]
pub enum RefreshInterval {
    OneSecond,
    #[default]
    TwoSeconds,
    FiveSeconds,
    TenSeconds,
}

impl RefreshInterval {
    /// All supported intervals, shortest first.
    pub const ALL: [RefreshInterval; 4] = [
        RefreshInterval::OneSecond,
        RefreshInterval::TwoSeconds,
        RefreshInterval::FiveSeconds,
        RefreshInterval::TenSeconds,
    ];

    pub fn as_secs(&self) -> u64 {
        match self {
            RefreshInterval::OneSecond => 1,
            RefreshInterval::TwoSeconds => 2,
            RefreshInterval::FiveSeconds => 5,
            RefreshInterval::TenSeconds => 10,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = InvalidInterval;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_secs() == secs)
            .ok_or(InvalidInterval(secs))
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}
