//! Domain types for the release watcher
//!
//! - [`TrackedProject`] - one upstream project, statically configured
//! - [`ReleaseDescriptor`] - the latest release of a project at fetch time

mod project;
mod release;

pub use project::TrackedProject;
pub use release::ReleaseDescriptor;
