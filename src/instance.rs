//! Instance descriptors.

use std::fmt;

use serde::Deserialize;

/// Identifier of the synthetic demo instance.
pub const DEMO_INSTANCE_ID: &str = "demo";

/// Stable identifier of a monitored instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A configured instance: where to fetch status from and how to authenticate.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceDescriptor {
    pub id: InstanceId,
    /// Display name. Falls back to the id when empty.
    #[serde(default)]
    pub name: String,
    /// Base URL of the status endpoint.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl InstanceDescriptor {
    /// Create a descriptor without credentials.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: InstanceId::new(id),
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// The synthetic instance that replays canned data.
    pub fn demo() -> Self {
        Self {
            id: InstanceId::new(DEMO_INSTANCE_ID),
            name: "Demo".to_string(),
            url: String::new(),
            username: None,
            password: None,
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn is_demo(&self) -> bool {
        self.id.as_str() == DEMO_INSTANCE_ID
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

// Keep passwords out of logs.
impl fmt::Debug for InstanceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
