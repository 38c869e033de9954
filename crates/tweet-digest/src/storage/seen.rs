//! Persistent set of already processed tweet IDs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{timestamp_now, write_json_atomic};
use crate::error::DigestResult;

/// On-disk shape of the seen-tweets file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SeenFile {
    #[serde(default)]
    seen_tweet_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

/// Tracks processed tweet IDs across runs.
///
/// IDs are only ever added. The set is loaded once per run and written back after
/// each handle, so a crash loses at most the handle in progress.
#[derive(Debug, Clone)]
pub struct SeenTweetStore {
    path: PathBuf,
    ids: HashSet<String>,
    last_updated: Option<String>,
}

impl SeenTweetStore {
    /// Create an empty store that persists to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: HashSet::new(),
            last_updated: None,
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file gives an empty store. An unreadable or corrupt file is logged
    /// and also gives an empty store; this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self::new(path.clone());

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No seen-tweets file, starting fresh");
                return store;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read seen tweets, starting fresh");
                return store;
            }
        };

        match serde_json::from_str::<SeenFile>(&content) {
            Ok(file) => {
                store.ids = file.seen_tweet_ids.into_iter().collect();
                store.last_updated = file.last_updated;
                tracing::debug!(path = %path.display(), count = store.ids.len(), "Loaded seen tweets");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not parse seen tweets, starting fresh");
            }
        }

        store
    }

    /// Check if a tweet ID has been seen.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Mark a tweet ID as seen. Returns `true` if the ID was new.
    pub fn mark_seen(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Write the full set to disk, replacing the previous file atomically.
    pub fn persist(&mut self) -> DigestResult<()> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort_unstable();

        let now = timestamp_now();
        let file = SeenFile {
            seen_tweet_ids: ids,
            last_updated: Some(now.clone()),
        };
        write_json_atomic(&self.path, &file)?;
        self.last_updated = Some(now);

        tracing::debug!(path = %self.path.display(), count = self.ids.len(), "Persisted seen tweets");
        Ok(())
    }

    /// Number of seen IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no IDs have been seen.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// When the store was last persisted, if ever.
    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    /// File the store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
