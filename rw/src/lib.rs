//! ReleaseWatch - polls upstream projects for new releases and emails once per release
//!
//! Each run fetches the latest release of every tracked project, compares its
//! tag against the persisted checkpoint, notifies on change, and records the
//! tag only after the notification was accepted.

pub mod cli;
pub mod config;
pub mod domain;
pub mod fetcher;
pub mod notifier;
pub mod watcher;

pub use config::Config;
pub use domain::{ReleaseDescriptor, TrackedProject};
pub use fetcher::{FetchError, GithubFetcher, ReleaseFetcher};
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
pub use watcher::{ReleaseWatcher, RunReport, WatcherConfig};
