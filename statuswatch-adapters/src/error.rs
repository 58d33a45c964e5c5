//! Error types for status collection.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while fetching or decoding a status payload.
///
/// Missing or malformed fields inside an otherwise valid payload are not
/// errors; the normalizer simply leaves them out of the snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Response body was not a JSON object.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// The user-facing category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::Decode(_) => ErrorCategory::Decode,
            FetchError::Http(_)
            | FetchError::Auth(_)
            | FetchError::Connection(_)
            | FetchError::Timeout => ErrorCategory::Transport,
        }
    }
}

/// Coarse classification of fetch failures, shown alongside the error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Timeout, refused connection, TLS failure or bad HTTP status.
    Transport,
    /// The response was not a usable JSON object.
    Decode,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transport => f.write_str("transport error"),
            ErrorCategory::Decode => f.write_str("decode error"),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_share_a_category() {
        assert_eq!(FetchError::Timeout.category(), ErrorCategory::Transport);
        assert_eq!(
            FetchError::Connection("refused".into()).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            FetchError::Auth("401".into()).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            FetchError::Http("500".into()).category(),
            ErrorCategory::Transport
        );
    }

    #[test]
    fn decode_category() {
        let err = FetchError::Decode("expected value at line 1".into());
        assert_eq!(err.category(), ErrorCategory::Decode);
        assert_eq!(err.category().to_string(), "decode error");
    }

    #[test]
    fn display_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            FetchError::Auth("Invalid credentials".into()).to_string(),
            "Authentication failed: Invalid credentials"
        );
    }
}
