//! HTTP-backed status source.

use std::time::Duration;

use async_trait::async_trait;
use statuswatch_adapters::{FetchError, StatusClient};
use statuswatch_types::StatusSnapshot;

use super::StatusSource;
use crate::instance::InstanceDescriptor;

/// A source that GETs the instance's status endpoint and normalizes the body.
#[derive(Debug)]
pub struct HttpSource {
    client: StatusClient,
    description: String,
}

impl HttpSource {
    /// Create a source for the given instance with a request timeout.
    pub fn new(descriptor: &InstanceDescriptor, timeout: Duration) -> Result<Self, FetchError> {
        let mut builder = StatusClient::builder()
            .endpoint(descriptor.url.as_str())
            .timeout(timeout);

        builder = match (&descriptor.username, &descriptor.password) {
            (Some(user), Some(password)) => builder.credentials(user.as_str(), password.as_str()),
            (Some(user), None) => builder.username(user.as_str()),
            _ => builder,
        };

        let client = builder.build()?;
        let description = format!("http: {}", client.endpoint());
        Ok(Self {
            client,
            description,
        })
    }
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        self.client.fetch().await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
