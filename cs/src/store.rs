//! File-backed checkpoint store

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Checkpoint, StoreError};

/// Storage backend for the checkpoint
///
/// `load` never fails: a missing or unreadable checkpoint means no project
/// has been notified yet. `save` replaces the stored checkpoint as a whole.
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint, falling back to an empty one
    fn load(&self) -> Checkpoint;

    /// Overwrite the stored checkpoint
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), StoreError>;
}

/// On-disk layout of the checkpoint file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// JSON object mapping project key to tag
    Json,
    /// A single tag string for one project
    BareTag {
        /// Project key the tag belongs to
        key: String,
    },
}

/// Checkpoint stored in a single file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
    layout: Layout,
}

impl FileCheckpointStore {
    pub fn new(path: impl AsRef<Path>, layout: Layout) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!(?path, ?layout, "FileCheckpointStore::new: called");
        Self { path, layout }
    }

    /// Store using the JSON object layout
    pub fn json(path: impl AsRef<Path>) -> Self {
        Self::new(path, Layout::Json)
    }

    /// Store using the bare tag layout for a single project
    pub fn bare(path: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self::new(path, Layout::BareTag { key: key.into() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Read the checkpoint without downgrading errors
    ///
    /// Returns `Ok(None)` when no checkpoint has been written yet.
    pub fn read(&self) -> Result<Option<Checkpoint>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "read: no checkpoint file");
                return Ok(None);
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(StoreError::Malformed {
                    path: self.path.clone(),
                    reason: "not valid UTF-8".to_string(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        self.decode(&content).map(Some)
    }

    fn decode(&self, content: &str) -> Result<Checkpoint, StoreError> {
        match &self.layout {
            Layout::Json => {
                let tags: BTreeMap<String, String> =
                    serde_json::from_str(content).map_err(|source| StoreError::Parse {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(tags.into_iter().collect())
            }
            Layout::BareTag { key } => {
                let tag = content.trim();
                if tag.is_empty() {
                    return Ok(Checkpoint::new());
                }
                if tag.contains(char::is_whitespace) {
                    return Err(StoreError::Malformed {
                        path: self.path.clone(),
                        reason: "expected a single tag".to_string(),
                    });
                }
                Ok([(key.as_str(), tag)].into_iter().collect())
            }
        }
    }

    fn encode(&self, checkpoint: &Checkpoint) -> Result<String, StoreError> {
        match &self.layout {
            Layout::Json => {
                let mut content = serde_json::to_string_pretty(checkpoint).map_err(StoreError::Encode)?;
                content.push('\n');
                Ok(content)
            }
            Layout::BareTag { key } => Ok(checkpoint.get(key).map(|tag| format!("{tag}\n")).unwrap_or_default()),
        }
    }

    /// Sibling file the new content is written to before the rename
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| crate::DEFAULT_FILE_NAME.to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Checkpoint {
        match self.read() {
            Ok(Some(checkpoint)) => {
                info!(
                    path = %self.path.display(),
                    projects = checkpoint.len(),
                    "Loaded checkpoint"
                );
                checkpoint
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No checkpoint found, starting fresh");
                Checkpoint::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unusable checkpoint, starting fresh");
                Checkpoint::new()
            }
        }
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let content = self.encode(checkpoint)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let staging = self.staging_path();
        fs::write(&staging, content).map_err(write_err)?;
        if let Err(source) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(write_err(source));
        }

        info!(
            path = %self.path.display(),
            projects = checkpoint.len(),
            "Saved checkpoint"
        );
        Ok(())
    }
}
