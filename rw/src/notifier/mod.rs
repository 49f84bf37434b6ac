//! Release notifier
//!
//! Sends one human-readable message per detected release to a fixed,
//! pre-configured recipient.

use async_trait::async_trait;

mod error;
mod smtp;
mod template;

pub use error::NotifyError;
pub use smtp::SmtpNotifier;
pub use template::{EmailTemplates, RenderedEmail};

use crate::domain::{ReleaseDescriptor, TrackedProject};

/// Notification channel for new releases
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch exactly one message announcing `release` of `project`
    async fn notify(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<(), NotifyError>;
}
