//! Fetch error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur fetching a release
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No published release for {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Short label for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "not_found",
            FetchError::Api { .. } => "api",
            FetchError::Network(_) => "network",
            FetchError::InvalidResponse(_) => "invalid_response",
            FetchError::Timeout(_) => "timeout",
        }
    }

    /// The project exists upstream but has no published release
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}
