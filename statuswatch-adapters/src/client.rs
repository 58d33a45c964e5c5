//! HTTP client for status endpoints.
//!
//! Performs a plain GET against the instance's base URL and hands the body
//! to [`decode`](crate::decode). No other protocol framing is involved.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statuswatch_adapters::StatusClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StatusClient::builder()
//!         .endpoint("http://nas.local:9100")
//!         .credentials("monitor", "secret")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let snapshot = client.fetch().await?;
//!     if let Some(cpu) = &snapshot.cpu {
//!         println!("{} cores", cpu.cpu_cores.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use statuswatch_types::{current_timestamp_ms, StatusSnapshot};

use crate::{decode, FetchError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a single status endpoint.
#[derive(Debug, Clone)]
pub struct StatusClient {
    client: Client,
    endpoint: String,
    credentials: Option<(String, Option<String>)>,
}

impl StatusClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> StatusClientBuilder {
        StatusClientBuilder::default()
    }

    /// The endpoint this client fetches from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch and normalize one status payload.
    ///
    /// The returned snapshot is stamped with the current time.
    pub async fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        let body = self.fetch_raw().await?;
        let mut snapshot = decode(&body)?;
        snapshot.captured_at_ms = current_timestamp_ms();
        Ok(snapshot)
    }

    /// Fetch the raw response body.
    pub async fn fetch_raw(&self) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, password.as_ref());
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::Auth("Invalid credentials".to_string()));
        }

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "Endpoint returned status {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

/// Builder for StatusClient.
#[derive(Debug, Default)]
pub struct StatusClientBuilder {
    endpoint: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl StatusClientBuilder {
    /// Set the status endpoint (e.g., "http://localhost:9100").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the username and password for basic authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the username only. The request is sent without a password.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StatusClient, FetchError> {
        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9100".to_string());

        Ok(StatusClient {
            client,
            endpoint: trim_endpoint(&endpoint),
            credentials: self.username.map(|user| (user, self.password)),
        })
    }
}

fn trim_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}
