//! Settings loading and validation.
//!
//! Settings are layered: built-in defaults, then an optional file (any
//! format the `config` crate recognises by extension), then environment
//! variables prefixed with `STATUSWATCH_`. Nested keys use `__`, e.g.
//! `STATUSWATCH_REQUEST_TIMEOUT=5`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::DEFAULT_CAPACITY;
use crate::instance::{InstanceDescriptor, InstanceId, DEMO_INSTANCE_ID};
use crate::scheduler::{RefreshInterval, SchedulerOptions};

/// Smallest history that still yields one delta.
pub const MIN_HISTORY_CAPACITY: usize = 2;

const ENV_PREFIX: &str = "STATUSWATCH";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between scheduled fetches.
    pub refresh_interval: RefreshInterval,
    /// Snapshots kept per instance (the chart window).
    pub history_capacity: usize,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    pub demo_mode: bool,
    /// Instance to select at start-up.
    pub selected: Option<InstanceId>,
    pub instances: Vec<InstanceDescriptor>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: RefreshInterval::default(),
            history_capacity: DEFAULT_CAPACITY,
            request_timeout: 10,
            demo_mode: false,
            selected: None,
            instances: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for values the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity < MIN_HISTORY_CAPACITY {
            bail!(
                "history_capacity must be at least {}, got {}",
                MIN_HISTORY_CAPACITY,
                self.history_capacity
            );
        }
        if self.request_timeout == 0 {
            bail!("request_timeout must be greater than zero");
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            let id = instance.id.as_str();
            if id.trim().is_empty() {
                bail!("instance with url '{}' has an empty id", instance.url);
            }
            if id == DEMO_INSTANCE_ID {
                bail!("instance id '{}' is reserved for demo mode", DEMO_INSTANCE_ID);
            }
            if !seen.insert(id) {
                bail!("duplicate instance id '{}'", id);
            }
            if !has_http_scheme(&instance.url) {
                bail!(
                    "instance '{}' has unsupported url '{}' (expected http:// or https://)",
                    id,
                    instance.url
                );
            }
        }

        if let Some(selected) = &self.selected {
            let known = seen.contains(selected.as_str())
                || (self.demo_mode && selected.as_str() == DEMO_INSTANCE_ID);
            if !known {
                bail!("selected instance '{}' is not configured", selected);
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            history_capacity: self.history_capacity,
            fetch_timeout: self.request_timeout(),
        }
    }
}

fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.len() > scheme.len() && url[..scheme.len()].eq_ignore_ascii_case(scheme)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn empty_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, empty_env()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.refresh_interval, RefreshInterval::TwoSeconds);
        assert_eq!(settings.history_capacity, 30);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_file(
            ".toml",
            r#"
refresh_interval = 5
history_capacity = 60
selected = "nas"

[[instances]]
id = "nas"
name = "Home NAS"
url = "http://nas.local:9100"
username = "admin"
password = "secret"

[[instances]]
id = "web"
url = "https://web.example.com/status"
"#,
        );

        let settings = Settings::load_with_env(Some(file.path()), empty_env()).unwrap();
        assert_eq!(settings.refresh_interval, RefreshInterval::FiveSeconds);
        assert_eq!(settings.history_capacity, 60);
        assert_eq!(settings.selected, Some(InstanceId::from("nas")));
        assert_eq!(settings.instances.len(), 2);
        assert_eq!(settings.instances[0].display_name(), "Home NAS");
        assert_eq!(settings.instances[0].password.as_deref(), Some("secret"));
        assert_eq!(settings.instances[1].display_name(), "web");
    }

    #[test]
    fn test_load_json_file() {
        let file = write_file(
            ".json",
            r#"{ "demo_mode": true, "selected": "demo", "request_timeout": 3 }"#,
        );
        let settings = Settings::load_with_env(Some(file.path()), empty_env()).unwrap();
        assert!(settings.demo_mode);
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_file(".toml", "refresh_interval = 5\n");
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::from([
            ("STATUSWATCH_REFRESH_INTERVAL".to_string(), "10".to_string()),
            ("STATUSWATCH_DEMO_MODE".to_string(), "true".to_string()),
        ])));

        let settings = Settings::load_with_env(Some(file.path()), env).unwrap();
        assert_eq!(settings.refresh_interval, RefreshInterval::TenSeconds);
        assert!(settings.demo_mode);
    }

    #[test]
    fn test_unsupported_interval_rejected() {
        let file = write_file(".toml", "refresh_interval = 3\n");
        assert!(Settings::load_with_env(Some(file.path()), empty_env()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/statuswatch.toml");
        assert!(Settings::load_with_env(Some(path), empty_env()).is_err());
    }

    #[test]
    fn test_validate_capacity_and_timeout() {
        let mut settings = Settings {
            history_capacity: 1,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.history_capacity = 2;
        settings.request_timeout = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_instances() {
        let mut settings = Settings {
            instances: vec![
                InstanceDescriptor::new("nas", "http://nas"),
                InstanceDescriptor::new("nas", "http://other"),
            ],
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        settings.instances = vec![InstanceDescriptor::new("nas", "ftp://nas")];
        assert!(settings.validate().is_err());

        settings.instances = vec![InstanceDescriptor::new("", "http://nas")];
        assert!(settings.validate().is_err());

        settings.instances = vec![InstanceDescriptor::new("demo", "http://nas")];
        assert!(settings.validate().is_err());

        settings.instances = vec![InstanceDescriptor::new("nas", "HTTPS://nas")];
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_selected() {
        let mut settings = Settings {
            instances: vec![InstanceDescriptor::new("nas", "http://nas")],
            selected: Some(InstanceId::from("web")),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.selected = Some(InstanceId::from("demo"));
        assert!(settings.validate().is_err());

        settings.demo_mode = true;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_scheduler_options() {
        let settings = Settings {
            history_capacity: 12,
            request_timeout: 4,
            ..Settings::default()
        };
        let options = settings.scheduler_options();
        assert_eq!(options.history_capacity, 12);
        assert_eq!(options.fetch_timeout, Duration::from_secs(4));
    }
}
