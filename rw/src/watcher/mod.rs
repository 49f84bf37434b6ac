//! Release watcher
//!
//! Runs the fetch / compare / notify / checkpoint cycle over every tracked
//! project, one at a time, in declared order.

mod config;
mod outcome;
mod release_watcher;

pub use config::WatcherConfig;
pub use outcome::{CheckpointOutcome, ProjectOutcome, ProjectReport, RunReport, SkipReason};
pub use release_watcher::{Change, ReleaseWatcher, compare};
