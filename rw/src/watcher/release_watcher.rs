//! Release watcher implementation

use std::sync::Arc;

use checkpointstore::{Checkpoint, CheckpointStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::WatcherConfig;
use super::outcome::{CheckpointOutcome, ProjectOutcome, ProjectReport, RunReport, SkipReason};
use crate::domain::{ReleaseDescriptor, TrackedProject};
use crate::fetcher::{FetchError, ReleaseFetcher};
use crate::notifier::{Notifier, NotifyError};

/// How an upstream tag relates to the checkpointed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// No tag was ever checkpointed for the project
    FirstSeen,
    /// The upstream tag differs from the checkpointed tag
    Updated,
    Unchanged,
}

/// Compare the checkpointed tag with the latest upstream tag
///
/// Exact string comparison; an absent checkpoint never equals any tag,
/// including the empty string.
pub fn compare(last: Option<&str>, latest: &str) -> Change {
    match last {
        None => Change::FirstSeen,
        Some(last) if last == latest => Change::Unchanged,
        Some(_) => Change::Updated,
    }
}

/// The ReleaseWatcher checks every tracked project once per run and sends
/// one notification per new release
///
/// The checkpoint is loaded at the start of a run and saved at most once at
/// the end, only when at least one notification went out. A project's tag
/// is recorded only after its notification was accepted, so a failed send
/// is retried on the next run.
pub struct ReleaseWatcher {
    config: WatcherConfig,
    projects: Vec<TrackedProject>,
    fetcher: Arc<dyn ReleaseFetcher>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn CheckpointStore>,
}

impl ReleaseWatcher {
    /// Create a new ReleaseWatcher
    pub fn new(
        config: WatcherConfig,
        projects: Vec<TrackedProject>,
        fetcher: Arc<dyn ReleaseFetcher>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            config,
            projects,
            fetcher,
            notifier,
            store,
        }
    }

    /// Run a single pass over all tracked projects
    ///
    /// Never fails as a whole: every project is attempted and every
    /// failure is folded into the report.
    pub async fn run_once(&self) -> RunReport {
        info!(projects = self.projects.len(), "Starting release check");

        let mut checkpoint = self.store.load();
        let mut dirty = false;
        let mut projects = Vec::with_capacity(self.projects.len());

        for project in &self.projects {
            let outcome = self.check_project(project, &mut checkpoint).await;
            dirty |= outcome.is_notified();
            projects.push(ProjectReport {
                project: project.key().to_string(),
                display_name: project.display_name.clone(),
                outcome,
            });
        }

        let checkpoint = if dirty {
            self.persist(&checkpoint)
        } else {
            debug!("run_once: no changes, checkpoint untouched");
            CheckpointOutcome::Untouched
        };

        let report = RunReport { projects, checkpoint };
        info!(
            notified = report.notified(),
            skipped = report.skipped(),
            "Release check complete"
        );
        report
    }

    /// Run passes until a shutdown message arrives, returning the number of runs
    ///
    /// A run in progress always completes; shutdown is observed between runs.
    pub async fn watch(&self, mut shutdown: mpsc::Receiver<()>) -> usize {
        info!(
            interval_secs = self.config.poll_interval_secs,
            projects = self.projects.len(),
            "ReleaseWatcher started"
        );

        let mut runs = 0;
        loop {
            self.run_once().await;
            runs += 1;

            tokio::select! {
                _ = shutdown.recv() => {
                    info!(runs, "ReleaseWatcher stopping");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval()) => {
                    debug!("watch: poll interval elapsed");
                }
            }
        }
        runs
    }

    async fn check_project(&self, project: &TrackedProject, checkpoint: &mut Checkpoint) -> ProjectOutcome {
        info!(project = %project.slug(), "Checking {}...", project.display_name);

        let release = match self.fetch(project).await {
            Ok(release) => release,
            Err(e) => {
                if e.is_not_found() {
                    warn!(project = %project.slug(), "No published release, skipping");
                } else {
                    error!(
                        project = %project.slug(),
                        kind = e.kind(),
                        error = %e,
                        "Failed to fetch latest release, skipping"
                    );
                }
                return ProjectOutcome::Skipped(SkipReason::Fetch {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        };

        let last = checkpoint.get(project.key()).map(String::from);
        let change = compare(last.as_deref(), &release.tag);
        if change == Change::Unchanged {
            info!(project = %project.slug(), tag = %release.tag, "No new release");
            return ProjectOutcome::Unchanged { tag: release.tag };
        }

        info!(
            project = %project.slug(),
            ?change,
            old_tag = last.as_deref().unwrap_or("none"),
            new_tag = %release.tag,
            "New release found"
        );

        match self.notify(project, &release).await {
            Ok(()) => {
                checkpoint.set(project.key(), release.tag.clone());
                info!(project = %project.slug(), tag = %release.tag, "Notification sent");
                ProjectOutcome::Notified {
                    previous: last,
                    tag: release.tag,
                }
            }
            Err(e) => {
                error!(
                    project = %project.slug(),
                    tag = %release.tag,
                    kind = e.kind(),
                    error = %e,
                    "Failed to send notification, will retry next run"
                );
                if e.is_authentication() {
                    warn!("Check the mail account credentials. Providers with 2FA usually require an app password.");
                }
                ProjectOutcome::Skipped(SkipReason::Notify {
                    tag: release.tag,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn fetch(&self, project: &TrackedProject) -> Result<ReleaseDescriptor, FetchError> {
        let timeout = self.config.call_timeout();
        tokio::time::timeout(timeout, self.fetcher.latest_release(project))
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(timeout)))
    }

    async fn notify(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<(), NotifyError> {
        let timeout = self.config.call_timeout();
        tokio::time::timeout(timeout, self.notifier.notify(project, release))
            .await
            .unwrap_or_else(|_| Err(NotifyError::Timeout(timeout)))
    }

    fn persist(&self, checkpoint: &Checkpoint) -> CheckpointOutcome {
        match self.store.save(checkpoint) {
            Ok(()) => CheckpointOutcome::Saved,
            Err(e) => {
                // Sent notifications stay sent; the next run may repeat them
                error!(error = %e, "Failed to save checkpoint");
                CheckpointOutcome::SaveFailed(e.to_string())
            }
        }
    }
}
