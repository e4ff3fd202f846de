//! Per-feed sync state: the keys believed to exist in the destination.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::candidate::EventKey;
use crate::error::{FeedsError, FeedsResult};

/// Set of keys for one feed.
pub type KeySet = BTreeSet<EventKey>;

/// Persistent key sets, one entry per feed.
///
/// `store` always replaces the whole entry; there is no merge.
pub trait SyncStateStore {
    /// Keys for `feed`, empty if nothing was stored yet.
    fn load(&self, feed: &str) -> FeedsResult<KeySet>;

    fn store(&self, feed: &str, keys: &KeySet) -> FeedsResult<()>;

    fn clear(&self, feed: &str) -> FeedsResult<()>;
}

/// State kept in a single JSON file: `{ "<feed>": ["<key>", ...] }`.
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> FeedsResult<BTreeMap<String, KeySet>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            FeedsError::Serialization(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, state: &BTreeMap<String, KeySet>) -> FeedsResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let temp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| FeedsError::Serialization(e.to_string()))?;

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl SyncStateStore for JsonStateStore {
    fn load(&self, feed: &str) -> FeedsResult<KeySet> {
        Ok(self.read_all()?.remove(feed).unwrap_or_default())
    }

    fn store(&self, feed: &str, keys: &KeySet) -> FeedsResult<()> {
        let mut state = self.read_all()?;
        state.insert(feed.to_string(), keys.clone());
        self.write_all(&state)
    }

    fn clear(&self, feed: &str) -> FeedsResult<()> {
        let mut state = self.read_all()?;
        if state.remove(feed).is_some() {
            self.write_all(&state)?;
        }
        Ok(())
    }
}
