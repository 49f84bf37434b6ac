//! Release fetcher
//!
//! Retrieves the latest published release of a tracked project. "Latest" is
//! whatever the upstream reports; no local ordering is applied.

use async_trait::async_trait;

mod error;
mod github;

pub use error::FetchError;
pub use github::GithubFetcher;

use crate::domain::{ReleaseDescriptor, TrackedProject};

/// Source of "latest release" descriptors
///
/// Implementations must never return a descriptor without a tag; a missing
/// tag is reported as [`FetchError::InvalidResponse`].
#[async_trait]
pub trait ReleaseFetcher: Send + Sync {
    /// Fetch the most recently published release for a project
    async fn latest_release(&self, project: &TrackedProject) -> Result<ReleaseDescriptor, FetchError>;
}
