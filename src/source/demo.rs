//! Synthetic source for demo mode.
//!
//! Produces canonical snapshots directly (no payload, no normalizer) that
//! vary deterministically from tick to tick so that charts move.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use statuswatch_adapters::FetchError;
use statuswatch_types::{
    Cpu, CpuCore, Frequencies, Host, LoadAverage, Memory, Network, StatusSnapshot, StorageVolume,
};

use super::StatusSource;

const GIB: u64 = 1024 * 1024 * 1024;
const CORES: u32 = 4;
const BASE_UPTIME_SECS: f64 = 1_234_567.0;

/// A source that replays varied canned snapshots.
#[derive(Debug, Default)]
pub struct DemoSource {
    tick: AtomicU64,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot for a given tick. Pure, so the sequence is reproducible.
    pub fn snapshot_at(tick: u64) -> StatusSnapshot {
        let wave = |period: u64, offset: u64| ((tick + offset) % period) as f64 / period as f64;

        let cpu_cores = (0..CORES)
            .map(|index| {
                let i = u64::from(index);
                CpuCore {
                    index,
                    temperatures: vec![42.0 + (wave(11, i * 3) * 20.0).round(), 100.0],
                    frequencies: Some(Frequencies {
                        base: Some(3_400),
                        min: Some(2_200),
                        max: Some(4_700),
                        now: Some(2_200 + (wave(13, i * 5) * 2_500.0) as u64),
                    }),
                }
            })
            .collect();

        // Cumulative counters only ever grow within a session.
        let rx = tick * 180_000 + (tick * tick % 7) * 25_000;
        let tx = tick * 60_000 + (tick % 5) * 10_000;

        StatusSnapshot::builder()
            .cpu(Cpu {
                count: Some(8),
                utilisation: Some(0.15 + wave(17, 0) * 0.6),
                model: Some("Demo CPU @ 3.40GHz".to_string()),
                cores: Some(u64::from(CORES)),
                cache: Some(8_192),
                cpu_cores,
            })
            .memory(Memory {
                cached: Some(3 * GIB),
                processes: Some(212),
                swap_available: Some(2 * GIB),
                swap_total: Some(2 * GIB),
                total: Some(16 * GIB),
                available: Some(6 * GIB + (wave(19, 0) * 4.0 * GIB as f64) as u64),
            })
            .storage(vec![
                StorageVolume {
                    name: "system".to_string(),
                    total: Some(512 * GIB),
                    available: Some(301 * GIB),
                    icon: Some("internaldrive".to_string()),
                },
                StorageVolume {
                    name: "backup".to_string(),
                    total: Some(4_000 * GIB),
                    available: Some(1_250 * GIB),
                    icon: Some("externaldrive".to_string()),
                },
            ])
            .network(Network {
                interface: Some("eth0".to_string()),
                speed: Some(1_000),
                rx: Some(rx),
                tx: Some(tx),
            })
            .host(Host {
                uptime: Some(BASE_UPTIME_SECS + tick as f64),
                os: Some("Demo Linux 6.1".to_string()),
                hostname: Some("demo".to_string()),
                loadavg: Some(LoadAverage {
                    one: 0.4 + wave(7, 0),
                    five: 0.6,
                    fifteen: 0.5,
                }),
                app_memory: Some("18.2 MB".to_string()),
            })
            .build()
    }
}

#[async_trait]
impl StatusSource for DemoSource {
    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        Ok(Self::snapshot_at(tick))
    }

    fn description(&self) -> &str {
        "demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_at_is_reproducible() {
        let mut a = DemoSource::snapshot_at(7);
        let mut b = DemoSource::snapshot_at(7);
        a.captured_at_ms = 0;
        b.captured_at_ms = 0;
        assert_eq!(a, b);
    }

    #[test]
    fn test_counters_are_monotonic() {
        let rx = |t| DemoSource::snapshot_at(t).network.unwrap().rx.unwrap();
        let tx = |t| DemoSource::snapshot_at(t).network.unwrap().tx.unwrap();
        for t in 0..50 {
            assert!(rx(t + 1) >= rx(t), "rx went backwards at tick {}", t);
            assert!(tx(t + 1) >= tx(t), "tx went backwards at tick {}", t);
        }
    }

    #[test]
    fn test_snapshot_shape() {
        let snapshot = DemoSource::snapshot_at(3);
        let cpu = snapshot.cpu.as_ref().unwrap();
        assert_eq!(cpu.cpu_cores.len(), CORES as usize);
        assert!(cpu.utilisation.unwrap() <= 1.0);

        let names: Vec<&str> = snapshot
            .storage
            .as_ref()
            .unwrap()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["backup", "system"]);
    }

    #[tokio::test]
    async fn test_fetch_advances() {
        let source = DemoSource::new();
        let first = source.fetch().await.unwrap();
        let second = source.fetch().await.unwrap();
        assert_ne!(first.network, second.network);
    }
}
