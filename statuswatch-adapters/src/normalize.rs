//! Conversion of raw status payloads into canonical snapshots.
//!
//! Status agents disagree on how they lay out CPU data. Some expose a single
//! package-level sensor (`Tctl` on AMD parts) that applies to every core,
//! others key temperatures by `"Core <n>"` and frequencies by `"cpu<n>"`.
//! Storage arrives as a map keyed by volume name. [`normalize`] reconciles
//! all of these into a [`StatusSnapshot`] without ever failing: a field it
//! cannot read is left out.
//!
//! ```text
//! { "cpu": { "frequencies": { "cpu10": .., "cpu2": .., "cpu0": .. },
//!            "temperatures": { "Core 0": [..], "Core 2": [..] } },
//!   "storage": { "sdb": {..}, "sda": {..} } }
//!        │
//!        ▼
//! StatusSnapshot { cpu.cpu_cores = [0, 2, 10], storage = [sda, sdb] }
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use statuswatch_types::{
    Cpu, CpuCore, Frequencies, Host, LoadAverage, Memory, Network, StatusSnapshot, StorageVolume,
};

use crate::FetchError;

/// Sensors whose readings apply to every core, in order of preference.
pub const AGGREGATE_SENSORS: &[&str] = &["Tctl", "Tdie"];

const FREQUENCY_KEY_PREFIX: &str = "cpu";
const TEMPERATURE_KEY_PREFIX: &str = "Core ";

/// Decode a response body and normalize it.
///
/// Fails only if the body is not JSON or its top level is not an object.
pub fn decode(body: &[u8]) -> Result<StatusSnapshot, FetchError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if !value.is_object() {
        return Err(FetchError::Decode(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    Ok(normalize(&value))
}

/// Normalize a raw payload into a canonical snapshot.
///
/// This is a pure function: the same payload always yields the same
/// snapshot. The snapshot's `captured_at_ms` is left at zero for the caller
/// to stamp. Anything other than a JSON object yields an empty snapshot.
pub fn normalize(raw: &Value) -> StatusSnapshot {
    let Some(root) = raw.as_object() else {
        return StatusSnapshot::default();
    };

    StatusSnapshot {
        captured_at_ms: 0,
        cpu: root.get("cpu").and_then(Value::as_object).map(cpu),
        memory: root.get("memory").and_then(Value::as_object).map(memory),
        storage: root.get("storage").and_then(Value::as_object).map(storage),
        network: root.get("network").and_then(Value::as_object).map(network),
        host: root.get("host").and_then(Value::as_object).map(host),
    }
}

fn cpu(obj: &Map<String, Value>) -> Cpu {
    Cpu {
        count: obj.get("count").and_then(as_count),
        utilisation: obj.get("utilisation").and_then(Value::as_f64),
        model: obj.get("model").and_then(as_string),
        cores: obj.get("cores").and_then(as_count),
        cache: obj.get("cache").and_then(as_count),
        cpu_cores: cpu_cores(obj),
    }
}

/// Build the per-core list from the `frequencies` and `temperatures` maps.
///
/// Cores are driven by the frequency map and ordered by the integer parsed
/// from each `cpu<n>` key. Map iteration order is never relied upon.
fn cpu_cores(obj: &Map<String, Value>) -> Vec<CpuCore> {
    let Some(frequencies) = obj.get("frequencies").and_then(Value::as_object) else {
        return Vec::new();
    };
    let temperatures = obj.get("temperatures").and_then(Value::as_object);

    let aggregate = temperatures.and_then(aggregate_temperatures);
    let per_core: BTreeMap<u32, Vec<f64>> = match (aggregate.is_some(), temperatures) {
        (false, Some(temps)) => temps
            .iter()
            .filter_map(|(key, value)| {
                let index = parse_index(key, TEMPERATURE_KEY_PREFIX)?;
                Some((index, temperature_list(value.as_array()?)))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    let mut indexed: Vec<(u32, &Value)> = frequencies
        .iter()
        .filter_map(|(key, value)| Some((parse_index(key, FREQUENCY_KEY_PREFIX)?, value)))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .map(|(index, freq)| CpuCore {
            index,
            temperatures: match &aggregate {
                Some(shared) => shared.clone(),
                None => per_core.get(&index).cloned().unwrap_or_default(),
            },
            frequencies: freq.as_object().map(frequency_block),
        })
        .collect()
}

fn aggregate_temperatures(temps: &Map<String, Value>) -> Option<Vec<f64>> {
    AGGREGATE_SENSORS
        .iter()
        .find_map(|name| temps.get(*name)?.as_array())
        .map(|readings| temperature_list(readings))
}

/// Parse the trailing core index from keys like `cpu12` or `Core 12`.
fn parse_index(key: &str, prefix: &str) -> Option<u32> {
    key.strip_prefix(prefix)?.parse().ok()
}

/// Numeric readings up to the first non-numeric entry, so that positions
/// keep their meaning (0 = current, 1 = max).
fn temperature_list(readings: &[Value]) -> Vec<f64> {
    readings.iter().map_while(Value::as_f64).collect()
}

fn frequency_block(obj: &Map<String, Value>) -> Frequencies {
    Frequencies {
        base: obj.get("base").and_then(as_count),
        min: obj.get("min").and_then(as_count),
        max: obj.get("max").and_then(as_count),
        now: obj.get("now").and_then(as_count),
    }
}

fn memory(obj: &Map<String, Value>) -> Memory {
    Memory {
        cached: obj.get("cached").and_then(as_count),
        processes: obj.get("processes").and_then(as_count),
        swap_available: obj.get("swap_available").and_then(as_count),
        swap_total: obj.get("swap_total").and_then(as_count),
        total: obj.get("total").and_then(as_count),
        available: obj.get("available").and_then(as_count),
    }
}

/// Flatten the volume map into a list sorted by name.
///
/// The map key is always the volume name, even if the attributes carry a
/// `name` of their own.
fn storage(obj: &Map<String, Value>) -> Vec<StorageVolume> {
    let mut volumes: Vec<StorageVolume> = obj
        .iter()
        .map(|(name, value)| {
            let attrs = value.as_object();
            let field = |key: &str| attrs.and_then(|a| a.get(key));
            StorageVolume {
                name: name.clone(),
                total: field("total").and_then(as_count),
                available: field("available").and_then(as_count),
                icon: field("icon").and_then(as_string),
            }
        })
        .collect();
    volumes.sort_by(|a, b| a.name.cmp(&b.name));
    volumes
}

fn network(obj: &Map<String, Value>) -> Network {
    Network {
        interface: obj.get("interface").and_then(as_string),
        speed: obj.get("speed").and_then(as_count),
        rx: obj.get("rx").and_then(as_count),
        tx: obj.get("tx").and_then(as_count),
    }
}

fn host(obj: &Map<String, Value>) -> Host {
    Host {
        uptime: obj.get("uptime").and_then(Value::as_f64),
        os: obj.get("os").and_then(as_string),
        hostname: obj.get("hostname").and_then(as_string),
        loadavg: obj.get("loadavg").and_then(load_average),
        app_memory: obj.get("app_memory").and_then(as_string),
    }
}

fn load_average(value: &Value) -> Option<LoadAverage> {
    match value.as_array()?.as_slice() {
        [one, five, fifteen, ..] => Some(LoadAverage {
            one: one.as_f64()?,
            five: five.as_f64()?,
            fifteen: fifteen.as_f64()?,
        }),
        _ => None,
    }
}

/// Non-negative integer, accepting whole or fractional JSON numbers.
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.round() as u64)
    })
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}
