//! Section types that make up a status snapshot.

/// CPU section of a snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Cpu {
    /// Number of logical CPUs (execution threads).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub count: Option<u64>,

    /// Overall utilisation as a fraction between 0.0 and 1.0.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub utilisation: Option<f64>,

    /// CPU model name.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub model: Option<String>,

    /// Number of physical cores.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cores: Option<u64>,

    /// Cache size as reported upstream.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cache: Option<u64>,

    /// Per-core readings, ordered by core index.
    pub cpu_cores: Vec<CpuCore>,
}

impl Cpu {
    /// Utilisation as a percentage clamped to 0-100.
    pub fn utilisation_percent(&self) -> Option<f64> {
        self.utilisation.map(|u| (u * 100.0).clamp(0.0, 100.0))
    }

    /// Highest "current" temperature (reading 0) across all cores.
    ///
    /// Returns `None` if no core reports a temperature.
    pub fn max_temperature(&self) -> Option<f64> {
        self.cpu_cores
            .iter()
            .filter_map(CpuCore::current_temperature)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
    }
}

/// Readings for a single CPU core.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CpuCore {
    /// Numeric core index taken from the upstream key (`cpu<n>`).
    pub index: u32,

    /// Temperature readings. Index 0 is the current reading and index 1,
    /// when present, the sensor maximum. May be empty.
    pub temperatures: Vec<f64>,

    /// Frequency block, if the core reported one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub frequencies: Option<Frequencies>,
}

impl CpuCore {
    /// The current temperature reading, if any.
    pub fn current_temperature(&self) -> Option<f64> {
        self.temperatures.first().copied()
    }

    /// The maximum temperature reported by the sensor, if any.
    pub fn max_temperature(&self) -> Option<f64> {
        self.temperatures.get(1).copied()
    }
}

/// Core frequency readings in MHz. Each sub-field is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Frequencies {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub base: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub min: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub max: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub now: Option<u64>,
}

/// Memory section. Values are passed through in the units the host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Memory {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cached: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub processes: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub swap_available: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub swap_total: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub available: Option<u64>,
}

impl Memory {
    /// Fraction of memory in use, `(total - available) / total`.
    pub fn used_fraction(&self) -> Option<f64> {
        used_fraction(self.total?, self.available?)
    }

    /// Fraction of swap in use.
    pub fn swap_used_fraction(&self) -> Option<f64> {
        used_fraction(self.swap_total?, self.swap_available?)
    }
}

/// A single storage volume.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StorageVolume {
    /// Volume name, taken from the upstream map key.
    pub name: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub available: Option<u64>,
    /// Display hint for the volume kind (e.g. "internal-drive").
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub icon: Option<String>,
}

impl StorageVolume {
    /// Fraction of the volume in use.
    pub fn used_fraction(&self) -> Option<f64> {
        used_fraction(self.total?, self.available?)
    }
}

/// Network section.
///
/// `rx` and `tx` are cumulative counters since host boot. Throughput must be
/// derived by diffing consecutive snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Network {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub interface: Option<String>,
    /// Link speed in Mbit/s.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub speed: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rx: Option<u64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub tx: Option<u64>,
}

impl Network {
    /// Link speed in Gbit/s.
    pub fn speed_gbit(&self) -> Option<f64> {
        self.speed.map(|s| s as f64 / 1000.0)
    }
}

/// Host metadata section.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Host {
    /// Seconds since boot.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub uptime: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub os: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub hostname: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub loadavg: Option<LoadAverage>,
    /// Memory footprint of the status agent itself, as reported.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub app_memory: Option<String>,
}

/// The 1, 5 and 15 minute load averages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

fn used_fraction(total: u64, available: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available) as f64;
    Some((used / total as f64).clamp(0.0, 1.0))
}
