//! Snapshot history and presentation helpers.
//!
//! ## Submodules
//!
//! - [`format`]: Formatting of uptimes and byte counts for display
//! - [`history`]: Fixed-capacity snapshot history and chart series
//!
//! ## Data Flow
//!
//! ```text
//! StatusSnapshot (normalized)
//!        │
//!        ▼
//! History::append()  ── evicts oldest beyond capacity
//!        │
//!        ├──▶ History::current()            (gauges, detail screens)
//!        ├──▶ History::series(N, field)     (line charts)
//!        └──▶ History::delta(N, counter)    (network throughput)
//! ```

pub mod format;
pub mod history;

pub use history::{History, DEFAULT_CAPACITY};
