//! Configured instances and the current selection.
//!
//! The [`Registry`] is the single owner of the [`Scheduler`]. Only the
//! selected instance is polled: selecting another instance removes the
//! previous one (timer and history) before the new one is started.

use std::collections::HashMap;
use std::time::Duration;

use statuswatch_adapters::FetchError;
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::instance::{InstanceDescriptor, InstanceId, DEMO_INSTANCE_ID};
use crate::scheduler::{InstanceHandle, InvalidInterval, RefreshInterval, Scheduler};
use crate::source;

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown instance '{0}'")]
    UnknownInstance(InstanceId),

    #[error("instance '{0}' is already configured")]
    DuplicateInstance(InstanceId),

    #[error("instance id '{0}' is reserved for demo mode")]
    ReservedInstance(InstanceId),

    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    #[error("failed to create status source: {0}")]
    Source(#[from] FetchError),
}

/// Holds the configured instances and drives polling of the selected one.
///
/// # Example
///
/// ```
/// use statuswatch::{Phase, Registry, Settings};
///
/// # tokio_test::block_on(async {
/// let settings = Settings { demo_mode: true, ..Settings::default() };
/// let mut registry = Registry::new(&settings);
///
/// let handle = registry.select_instance(&"demo".into()).unwrap();
/// assert_eq!(handle.phase(), Phase::Loading);
/// # });
/// ```
#[derive(Debug)]
pub struct Registry {
    instances: Vec<InstanceDescriptor>,
    intervals: HashMap<InstanceId, RefreshInterval>,
    default_interval: RefreshInterval,
    request_timeout: Duration,
    demo_mode: bool,
    selected: Option<InstanceId>,
    scheduler: Scheduler,
}

impl Registry {
    /// Create a registry from settings. Nothing is polled until an
    /// instance is selected.
    pub fn new(settings: &Settings) -> Self {
        Self {
            instances: settings.instances.clone(),
            intervals: HashMap::new(),
            default_interval: settings.refresh_interval,
            request_timeout: settings.request_timeout(),
            demo_mode: settings.demo_mode,
            selected: None,
            scheduler: Scheduler::with_options(settings.scheduler_options()),
        }
    }

    /// Configured instances. The demo instance is not listed.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceDescriptor> {
        self.instances.iter()
    }

    /// Look up a descriptor. The demo instance is only known in demo mode.
    pub fn descriptor(&self, id: &InstanceId) -> Option<InstanceDescriptor> {
        if self.demo_mode && id.as_str() == DEMO_INSTANCE_ID {
            return Some(InstanceDescriptor::demo());
        }
        self.instances.iter().find(|d| &d.id == id).cloned()
    }

    /// Register a new instance. It is not polled until selected.
    ///
    /// The demo id is reserved whether or not demo mode is on.
    pub fn add_instance(&mut self, descriptor: InstanceDescriptor) -> Result<(), RegistryError> {
        if descriptor.id.as_str() == DEMO_INSTANCE_ID {
            return Err(RegistryError::ReservedInstance(descriptor.id));
        }
        if self.descriptor(&descriptor.id).is_some() {
            return Err(RegistryError::DuplicateInstance(descriptor.id));
        }
        info!("Added instance {} ({})", descriptor.id, descriptor.url);
        self.instances.push(descriptor);
        Ok(())
    }

    pub fn selected(&self) -> Option<&InstanceId> {
        self.selected.as_ref()
    }

    /// Handle to the selected instance's state.
    pub fn selected_handle(&self) -> Option<InstanceHandle> {
        self.selected.as_ref().and_then(|id| self.scheduler.handle(id))
    }

    /// Handle to any started instance.
    pub fn handle(&self, id: &InstanceId) -> Option<InstanceHandle> {
        self.scheduler.handle(id)
    }

    /// Select an instance for display and start polling it.
    ///
    /// The previously selected instance is stopped and its history
    /// discarded. Selecting the instance that is already selected and
    /// running returns its handle unchanged.
    pub fn select_instance(&mut self, id: &InstanceId) -> Result<InstanceHandle, RegistryError> {
        let descriptor = self
            .descriptor(id)
            .ok_or_else(|| RegistryError::UnknownInstance(id.clone()))?;

        if self.selected.as_ref() == Some(id) && self.scheduler.is_running(id) {
            if let Some(handle) = self.scheduler.handle(id) {
                return Ok(handle);
            }
        }

        let source = source::for_descriptor(&descriptor, self.request_timeout)?;

        if let Some(previous) = self.selected.take() {
            if &previous != id {
                self.scheduler.remove(&previous);
                info!("Deselected {}", previous);
            }
        }

        let interval = self.interval(id);
        let handle = self.scheduler.start(id.clone(), source, interval);
        info!("Selected {} ({})", id, descriptor.display_name());
        self.selected = Some(id.clone());
        Ok(handle)
    }

    /// Stop polling without selecting anything else. History is discarded.
    pub fn deselect(&mut self) {
        if let Some(previous) = self.selected.take() {
            self.scheduler.remove(&previous);
            info!("Deselected {}", previous);
        }
    }

    /// The refresh interval used for an instance.
    pub fn interval(&self, id: &InstanceId) -> RefreshInterval {
        self.intervals
            .get(id)
            .copied()
            .unwrap_or(self.default_interval)
    }

    /// Change an instance's refresh interval, in seconds (1, 2, 5 or 10).
    ///
    /// A running instance is re-armed at the new cadence.
    pub fn set_refresh_interval(&mut self, id: &InstanceId, seconds: u64) -> Result<(), RegistryError> {
        let interval = RefreshInterval::try_from(seconds)?;
        if self.descriptor(id).is_none() {
            return Err(RegistryError::UnknownInstance(id.clone()));
        }
        self.intervals.insert(id.clone(), interval);
        self.scheduler.set_interval(id, interval);
        Ok(())
    }

    /// Fetch the instance now. Returns `false` if it is not being polled.
    pub fn force_fetch(&self, id: &InstanceId) -> bool {
        self.scheduler.force_fetch(id)
    }

    /// Remove an instance: stop its timer, discard its history and forget
    /// its descriptor.
    pub fn delete_instance(&mut self, id: &InstanceId) -> Result<InstanceDescriptor, RegistryError> {
        let position = self
            .instances
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| RegistryError::UnknownInstance(id.clone()))?;

        self.scheduler.remove(id);
        self.intervals.remove(id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }

        let descriptor = self.instances.remove(position);
        info!("Deleted instance {}", id);
        Ok(descriptor)
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    /// Toggle demo mode. Turning it off drops the demo instance if it was
    /// selected.
    pub fn set_demo_mode(&mut self, enabled: bool) {
        if self.demo_mode == enabled {
            return;
        }
        self.demo_mode = enabled;
        info!("Demo mode {}", if enabled { "enabled" } else { "disabled" });

        if !enabled {
            let demo = InstanceId::new(DEMO_INSTANCE_ID);
            self.scheduler.remove(&demo);
            self.intervals.remove(&demo);
            if self.selected.as_ref() == Some(&demo) {
                self.selected = None;
            }
        }
    }

    /// Stop all polling. Histories are kept until the registry is dropped.
    pub fn shutdown(&mut self) {
        self.scheduler.stop_all();
    }

    /// Number of live poll tasks.
    pub fn active_tasks(&self) -> usize {
        self.scheduler.active_tasks()
    }
}
