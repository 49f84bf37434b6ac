//! In-memory checkpoint mapping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from project key to the last notified tag
///
/// Keys are kept sorted so the serialized form is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    tags: BTreeMap<String, String>,
}

impl Checkpoint {
    /// Create an empty checkpoint (no project has ever been notified)
    pub fn new() -> Self {
        Self::default()
    }

    /// Last notified tag for a project, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Record a tag for a project, returning the previous tag
    pub fn set(&mut self, key: impl Into<String>, tag: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), tag.into())
    }

    /// Forget a project, returning the tag that was recorded
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate `(key, tag)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Checkpoint {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
