//! Per-project and per-run results

use std::fmt;

use serde::Serialize;

/// Why a project was skipped this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fetching the latest release failed
    Fetch { kind: String, message: String },
    /// Sending the notification failed; the checkpoint was not advanced
    Notify { tag: String, kind: String, message: String },
}

/// Terminal state of one project within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProjectOutcome {
    /// Upstream tag equals the checkpointed tag
    Unchanged { tag: String },
    /// A notification went out and the checkpoint now holds `tag`
    Notified { previous: Option<String>, tag: String },
    /// Nothing was changed for this project
    Skipped(SkipReason),
}

impl ProjectOutcome {
    pub fn is_notified(&self) -> bool {
        matches!(self, ProjectOutcome::Notified { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ProjectOutcome::Skipped(_))
    }
}

impl fmt::Display for ProjectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectOutcome::Unchanged { tag } => write!(f, "unchanged ({})", tag),
            ProjectOutcome::Notified { previous, tag } => {
                write!(f, "notified {} (was {})", tag, previous.as_deref().unwrap_or("none"))
            }
            ProjectOutcome::Skipped(SkipReason::Fetch { kind, message }) => {
                write!(f, "skipped, fetch failed [{}]: {}", kind, message)
            }
            ProjectOutcome::Skipped(SkipReason::Notify { tag, kind, message }) => {
                write!(f, "skipped {}, notify failed [{}]: {}", tag, kind, message)
            }
        }
    }
}

/// Result for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    /// Checkpoint key of the project
    pub project: String,
    pub display_name: String,
    #[serde(flatten)]
    pub outcome: ProjectOutcome,
}

/// What happened to the checkpoint at the end of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "checkpoint", content = "error", rename_all = "snake_case")]
pub enum CheckpointOutcome {
    /// No project changed, nothing written
    Untouched,
    Saved,
    /// Save failed; notifications already sent are not rolled back
    SaveFailed(String),
}

/// Result of one full pass over the tracked projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub projects: Vec<ProjectReport>,
    pub checkpoint: CheckpointOutcome,
}

impl RunReport {
    pub fn notified(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.is_notified()).count()
    }

    pub fn skipped(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.is_skipped()).count()
    }

    /// Outcome for a project key
    pub fn outcome(&self, project: &str) -> Option<&ProjectOutcome> {
        self.projects.iter().find(|p| p.project == project).map(|p| &p.outcome)
    }
}
