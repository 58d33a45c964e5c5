//! StatusSnapshot - one normalized reading of a monitored host.

use crate::{Cpu, Host, Memory, Network, StorageVolume};

/// A point-in-time reading of a monitored instance.
///
/// Every section is optional since upstream agents may omit any of them.
/// Storage volumes are kept sorted by name.
///
/// # Example
///
/// ```rust
/// use statuswatch_types::{StatusSnapshot, StorageVolume};
///
/// let snapshot = StatusSnapshot::builder()
///     .timestamp(1_700_000_000_000)
///     .storage(vec![StorageVolume {
///         name: "sda".to_string(),
///         total: Some(500),
///         available: Some(125),
///         icon: None,
///     }])
///     .build();
///
/// assert_eq!(snapshot.storage.as_ref().map(Vec::len), Some(1));
/// assert!(!snapshot.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusSnapshot {
    /// Unix timestamp in milliseconds when this snapshot was normalized.
    pub captured_at_ms: u64,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cpu: Option<Cpu>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub memory: Option<Memory>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub storage: Option<Vec<StorageVolume>>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub network: Option<Network>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub host: Option<Host>,
}

impl StatusSnapshot {
    /// Create an empty snapshot stamped with the current time.
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create an empty snapshot with a specific timestamp.
    pub fn with_timestamp(captured_at_ms: u64) -> Self {
        Self {
            captured_at_ms,
            ..Self::default()
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// True when no section is present.
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none()
            && self.memory.is_none()
            && self.storage.is_none()
            && self.network.is_none()
            && self.host.is_none()
    }

    /// Look up a storage volume by name.
    pub fn volume(&self, name: &str) -> Option<&StorageVolume> {
        self.storage.as_ref()?.iter().find(|v| v.name == name)
    }
}

/// Builder for constructing `StatusSnapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    cpu: Option<Cpu>,
    memory: Option<Memory>,
    storage: Option<Vec<StorageVolume>>,
    network: Option<Network>,
    host: Option<Host>,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (defaults to current time).
    pub fn timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn cpu(mut self, cpu: Cpu) -> Self {
        self.cpu = Some(cpu);
        self
    }

    pub fn memory(mut self, memory: Memory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set the storage volumes. They are sorted by name on insertion.
    pub fn storage(mut self, mut volumes: Vec<StorageVolume>) -> Self {
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        self.storage = Some(volumes);
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> StatusSnapshot {
        StatusSnapshot {
            captured_at_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            cpu: self.cpu,
            memory: self.memory,
            storage: self.storage,
            network: self.network,
            host: self.host,
        }
    }
}

/// Current Unix time in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
