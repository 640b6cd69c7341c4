//! Errors surfaced by [`ApiClient`](super::ApiClient).
//!
//! Callers branch on the variant: a [`ClientError::Network`] is worth retrying, an
//! [`ClientError::Authentication`] needs a new login, and the rest are reported.

use thiserror::Error;

/// Failure of one API call
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection dropped
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server rejected the credentials or token (401/403)
    #[error("Authentication failed with status {status}")]
    Authentication {
        /// HTTP status returned
        status: u16,
    },

    /// Any other non-success response
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status returned
        status: u16,
        /// Response body, or the status reason when empty
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Decoder message
        message: String,
    },
}

impl ClientError {
    /// Whether a retry might succeed without user action
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Authentication { .. } | Self::Decode { .. } => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}
