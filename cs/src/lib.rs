//! CheckpointStore - durable last-notified tag per tracked project
//!
//! A checkpoint is the only state a release watcher keeps between runs: for
//! every tracked project, the tag of the last release a notification was
//! sent for. It lives in a single flat file that is read once at the start
//! of a run and rewritten at most once at the end.
//!
//! # Layouts
//!
//! ```text
//! release_state.json          # Layout::Json
//! {
//!   "cesium": "1.120",
//!   "cesium-unreal": "v2.9.0"
//! }
//!
//! release_tag.txt             # Layout::BareTag (single project)
//! v2.9.0
//! ```
//!
//! # Example
//!
//! ```ignore
//! use checkpointstore::{CheckpointStore, FileCheckpointStore};
//!
//! let store = FileCheckpointStore::json("release_state.json");
//! let mut checkpoint = store.load();
//! checkpoint.set("cesium", "1.121");
//! store.save(&checkpoint)?;
//! ```

mod checkpoint;
mod error;
mod store;

pub use checkpoint::Checkpoint;
pub use error::StoreError;
pub use store::{CheckpointStore, FileCheckpointStore, Layout};

/// Default checkpoint file name
pub const DEFAULT_FILE_NAME: &str = "release_state.json";
