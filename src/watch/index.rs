// src/watch/index.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// What the last successful parse of a file produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: String,
    pub fingerprint: String,
}

/// Path -> key association for every backing file that has parsed at least
/// once.
///
/// A removal event carries nothing but a path, so this is the only way to
/// know which record a deleted file held. Entries survive parse failures:
/// a file that was good once and then got broken still resolves on delete.
#[derive(Debug, Default, Clone)]
pub struct PathIndex {
    entries: HashMap<PathBuf, IndexEntry>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn key_for(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(|e| e.key.as_str())
    }

    /// Record a successful parse. Returns the previous entry for the path.
    pub fn record(
        &mut self,
        path: &Path,
        key: impl Into<String>,
        fingerprint: impl Into<String>,
    ) -> Option<IndexEntry> {
        let entry = IndexEntry {
            key: key.into(),
            fingerprint: fingerprint.into(),
        };
        debug!(?path, key = %entry.key, "recorded path association");
        self.entries.insert(path.to_path_buf(), entry)
    }

    /// Drop the association for a path (the file is gone).
    pub fn forget(&mut self, path: &Path) -> Option<IndexEntry> {
        let removed = self.entries.remove(path);
        if removed.is_some() {
            debug!(?path, "forgot path association");
        }
        removed
    }

    /// The file backing `key`. With duplicates, the lexicographically last
    /// one, matching the initial scan's winner.
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .filter(|(_, e)| e.key == key)
            .map(|(p, _)| p)
            .max()
            .cloned()
    }

    /// Another file that still declares `key`, if any.
    pub fn other_path_for(&self, key: &str, except: &Path) -> Option<PathBuf> {
        self.entries
            .iter()
            .filter(|(p, e)| e.key == key && p.as_path() != except)
            .map(|(p, _)| p)
            .max()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &IndexEntry)> {
        self.entries.iter().map(|(p, e)| (p.as_path(), e))
    }
}
