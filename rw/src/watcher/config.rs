//! Watcher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ReleaseWatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Delay between runs in `watch` mode, in seconds
    #[serde(rename = "poll-interval-secs", default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on any single fetch or notify call, in milliseconds
    #[serde(rename = "call-timeout-ms", default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    3600
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl WatcherConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
