//! # statuswatch-adapters
//!
//! Collection and normalization of status payloads from remote hosts.
//!
//! Status agents report the same information in several incompatible JSON
//! layouts. This crate turns any of them into a canonical
//! [`StatusSnapshot`](statuswatch_types::StatusSnapshot).
//!
//! ## Components
//!
//! - [`normalize`] - pure conversion from a raw JSON value to a snapshot
//! - [`decode`] - body bytes to snapshot, rejecting non-JSON responses
//! - [`StatusClient`] (`http` feature) - HTTP(S) GET with timeout and basic auth
//!
//! ## Quick Start
//!
//! ```rust
//! use statuswatch_adapters::decode;
//!
//! let body = br#"{
//!     "cpu": { "frequencies": { "cpu1": { "now": 2200 }, "cpu0": { "now": 2100 } } },
//!     "storage": { "sdb": { "total": 100 }, "sda": { "total": 200 } }
//! }"#;
//!
//! let snapshot = decode(body).unwrap();
//! let cores = &snapshot.cpu.as_ref().unwrap().cpu_cores;
//! assert_eq!(cores[0].index, 0);
//! assert_eq!(snapshot.storage.as_ref().unwrap()[0].name, "sda");
//! ```

pub mod error;
pub mod normalize;

#[cfg(feature = "http")]
pub mod client;

pub use error::{ErrorCategory, FetchError};
pub use normalize::{decode, normalize};

#[cfg(feature = "http")]
pub use client::{StatusClient, StatusClientBuilder};

// Re-export types for convenience
pub use statuswatch_types::StatusSnapshot;
