//! # statuswatch
//!
//! Polls remote server status endpoints, normalizes their heterogeneous JSON
//! payloads into one canonical snapshot and keeps a bounded history per
//! instance for charts and gauges.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Registry                            │
//! │   instances ─ selected ─ demo mode                           │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ┌───────────┐  tick   ┌──────────┐  bytes  ┌────────────┐   │
//! │  │ Scheduler │───────▶│  source  │───────▶│ normalize  │   │
//! │  │ (1 task / │         │ Http|Demo│         │ (adapters) │   │
//! │  │ instance) │◀───────┴──────────┴─────────┴────────────┘   │
//! │  └─────┬─────┘  snapshot                                     │
//! │        ▼                                                     │
//! │  ┌───────────┐        ┌────────────────┐                     │
//! │  │  History  │──────▶│ InstanceHandle │──▶ presentation    │
//! │  └───────────┘        └────────────────┘                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`registry`]**: Configured instances and the selected one; only the
//!   selected instance is polled
//! - **[`scheduler`]**: One cancellable poll task per instance with the
//!   loading / ready / error lifecycle
//! - **[`source`]**: The [`StatusSource`] trait with HTTP and demo
//!   implementations
//! - **[`data`]**: The history buffer, chart series and display formatting
//! - **[`config`]**: Layered settings (file, environment)
//!
//! The canonical model lives in `statuswatch-types` and the normalizer and
//! HTTP client in `statuswatch-adapters`; both are re-exported here.
//!
//! ## Usage
//!
//! ### Polling the demo instance
//!
//! ```
//! use statuswatch::{Registry, Settings};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings { demo_mode: true, ..Settings::default() };
//! let mut registry = Registry::new(&settings);
//! let handle = registry.select_instance(&"demo".into()).unwrap();
//!
//! tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//! let snapshot = handle.current().unwrap();
//! assert!(snapshot.cpu.is_some());
//! # });
//! ```
//!
//! ### Charting network throughput
//!
//! ```
//! use statuswatch::History;
//! use statuswatch_types::{Network, StatusSnapshot};
//!
//! let mut history = History::new(30);
//! for rx in [1_000, 6_000, 9_000] {
//!     history.append(
//!         StatusSnapshot::builder()
//!             .network(Network { rx: Some(rx), ..Default::default() })
//!             .build(),
//!     );
//! }
//!
//! let rx = history.delta(3, |s| s.network.as_ref()?.rx);
//! assert_eq!(rx, vec![5_000, 3_000]);
//! ```

pub mod config;
pub mod data;
pub mod instance;
pub mod registry;
pub mod scheduler;
pub mod source;

// Re-export main types for convenience
pub use config::Settings;
pub use data::History;
pub use instance::{InstanceDescriptor, InstanceId};
pub use registry::{Registry, RegistryError};
pub use scheduler::{
    FetchFailure, InstanceHandle, InvalidInterval, Phase, RefreshInterval, Scheduler,
    SchedulerOptions, Trigger,
};
pub use source::{DemoSource, HttpSource, StatusSource};
pub use statuswatch_adapters::{ErrorCategory, FetchError};
pub use statuswatch_types::StatusSnapshot;
