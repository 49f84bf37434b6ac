//! Checkpoint store error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur reading or writing a checkpoint
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read checkpoint {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse checkpoint {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed checkpoint {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    /// Whether the stored content exists but cannot be understood
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Parse { .. } | StoreError::Malformed { .. })
    }
}
