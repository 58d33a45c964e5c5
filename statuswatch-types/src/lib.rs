//! # statuswatch-types
//!
//! The canonical schema for a single status reading of a monitored host.
//!
//! Upstream status endpoints report CPU, memory, storage, network and host
//! metadata in several loosely-typed shapes. Everything downstream of the
//! normalizer (history, charts, gauges) works with the types in this crate
//! instead, so it never has to care which shape a host produced.
//!
//! ## Design Goals
//!
//! - **Independent sections**: every top-level section is optional, and the
//!   absence of one never affects another
//! - **Absent over zero**: a missing reading is `None`, never a misleading `0`
//! - **Deterministic order**: CPU cores are ordered by core index and storage
//!   volumes by name, whatever order the upstream map used
//! - **Optional serialization**: enable the `serde` feature as needed
//!
//! ## Example
//!
//! ```rust
//! use statuswatch_types::{Memory, Network, StatusSnapshot};
//!
//! let snapshot = StatusSnapshot::builder()
//!     .memory(Memory {
//!         total: Some(16_000),
//!         available: Some(4_000),
//!         ..Memory::default()
//!     })
//!     .network(Network {
//!         interface: Some("eth0".to_string()),
//!         rx: Some(1_024),
//!         tx: Some(2_048),
//!         ..Network::default()
//!     })
//!     .build();
//!
//! assert!(snapshot.cpu.is_none());
//! assert_eq!(snapshot.memory.as_ref().and_then(|m| m.used_fraction()), Some(0.75));
//! ```

mod metrics;
mod snapshot;

pub use metrics::*;
pub use snapshot::*;
