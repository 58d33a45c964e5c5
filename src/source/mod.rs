//! Status sources for monitored instances.
//!
//! A [`StatusSource`] produces one canonical snapshot per call. Real
//! instances are backed by an HTTP fetch ([`HttpSource`]); the demo
//! instance replays synthetic data ([`DemoSource`]) so the rest of the
//! pipeline can run without a live host.

mod demo;
mod http;

pub use demo::DemoSource;
pub use http::HttpSource;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use statuswatch_adapters::FetchError;
use statuswatch_types::StatusSnapshot;

use crate::instance::InstanceDescriptor;

/// Trait for producing status snapshots for one instance.
///
/// # Example
///
/// ```
/// use statuswatch::{DemoSource, StatusSource};
///
/// # tokio_test::block_on(async {
/// let source = DemoSource::new();
/// let snapshot = source.fetch().await.unwrap();
/// assert!(snapshot.cpu.is_some());
/// # });
/// ```
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Fetch one snapshot.
    ///
    /// Implementations should not retry; the scheduler decides what a
    /// failure means for the instance.
    async fn fetch(&self) -> Result<StatusSnapshot, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// Build the source for a descriptor: the demo source for the demo
/// instance, an HTTP source otherwise.
pub fn for_descriptor(
    descriptor: &InstanceDescriptor,
    timeout: Duration,
) -> Result<Arc<dyn StatusSource>, FetchError> {
    if descriptor.is_demo() {
        return Ok(Arc::new(DemoSource::new()));
    }
    Ok(Arc::new(HttpSource::new(descriptor, timeout)?))
}
