// src/watch/classify.rs

//! Turning raw filesystem events into record-level updates.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{ErrorSink, LiveConfigError, Result};
use crate::fs::FileSystem;
use crate::record::{Record, RecordParser};
use crate::store::RecordStore;
use crate::types::{UpdateEvent, UpdateKind};
use crate::watch::events::{RawEvent, RawKind};
use crate::watch::filter::ConfigFileFilter;
use crate::watch::hash::fingerprint;
use crate::watch::index::PathIndex;
use crate::watch::scan::{load_all, ScanReport};

/// Classifies raw events for one directory.
///
/// Owns the path -> key index and reads the store, but never writes it:
/// applying the returned updates is the dispatcher's job. Not thread-safe
/// by itself; the watch loop calls it strictly one event at a time.
pub struct Classifier<R> {
    fs: Arc<dyn FileSystem>,
    filter: ConfigFileFilter,
    parser: Arc<dyn RecordParser<R>>,
    errors: Arc<dyn ErrorSink>,
    index: PathIndex,
}

impl<R: Record> Classifier<R> {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        filter: ConfigFileFilter,
        parser: Arc<dyn RecordParser<R>>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            fs,
            filter,
            parser,
            errors,
            index: PathIndex::new(),
        }
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn replace_index(&mut self, index: PathIndex) {
        self.index = index;
    }

    /// Scan `dir` with this classifier's filesystem, filter and parser.
    /// Does not touch the index.
    pub fn rescan(&self, dir: &Path) -> Result<ScanReport<R>> {
        load_all(self.fs.as_ref(), dir, &self.filter, self.parser.as_ref())
    }

    pub(crate) fn report(&self, error: &LiveConfigError) {
        self.errors.report(error);
    }

    /// Classify one raw event against the current store contents.
    ///
    /// Yields nothing for irrelevant paths, failed reads or parses, unknown
    /// deletions and saves that changed nothing; otherwise one update. When
    /// a file starts declaring a different key, the update for the key it
    /// used to declare comes first.
    pub fn classify(&mut self, event: &RawEvent, store: &RecordStore<R>) -> Vec<UpdateEvent<R>> {
        let path = event.path.as_path();

        if !self.filter.matches(path) {
            debug!(?path, "ignoring event for non-config path");
            return Vec::new();
        }

        let Some(kind) = event.ops.resolve() else {
            debug!(?path, ops = ?event.ops, "ignoring event with no relevant operation");
            return Vec::new();
        };

        let present = self.fs.is_file(path);
        match kind {
            RawKind::Write | RawKind::Create if !present => {
                debug!(?path, ?kind, "file already gone; handling as removal");
                self.on_removed(path, store)
            }
            RawKind::Remove if present => {
                debug!(?path, "file still present after removal event; re-reading");
                self.on_written(path, store)
            }
            RawKind::Write | RawKind::Create => self.on_written(path, store),
            RawKind::Remove => self.on_removed(path, store),
        }
    }

    fn on_written(&mut self, path: &Path, store: &RecordStore<R>) -> Vec<UpdateEvent<R>> {
        let bytes = match self.fs.read(path) {
            Ok(b) => b,
            Err(source) => {
                self.report(&LiveConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
                return Vec::new();
            }
        };
        let fp = fingerprint(&bytes);

        // With duplicates the cached value may come from another file, so
        // only a sole source can skip the parse.
        if let Some(entry) = self.index.get(path) {
            if entry.fingerprint == fp
                && store.contains_key(&entry.key)
                && self.index.other_path_for(&entry.key, path).is_none()
            {
                debug!(?path, key = %entry.key, "content unchanged; suppressing event");
                return Vec::new();
            }
        }

        let record = match self.parser.parse(&bytes) {
            Ok(r) => r,
            Err(source) => {
                // Keep both the cached value and the old association.
                self.report(&LiveConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                });
                return Vec::new();
            }
        };

        let key = record.key().to_string();
        let mut updates = Vec::new();

        if let Some(previous) = self.index.record(path, key.clone(), fp) {
            if previous.key != key {
                debug!(?path, old = %previous.key, new = %key, "file now declares a different key");
                updates.extend(self.release_key(&previous.key, path, store));
            }
        }

        match store.get(&key) {
            Some(current) if current == record => {
                debug!(?path, key = %key, "parsed record unchanged; suppressing event");
            }
            Some(_) => updates.push(UpdateEvent::new(UpdateKind::Modified, record, path)),
            None => updates.push(UpdateEvent::new(UpdateKind::Created, record, path)),
        }

        updates
    }

    fn on_removed(&mut self, path: &Path, store: &RecordStore<R>) -> Vec<UpdateEvent<R>> {
        let Some(entry) = self.index.forget(path) else {
            debug!(?path, "removed file never parsed; nothing to delete");
            return Vec::new();
        };

        self.release_key(&entry.key, path, store).into_iter().collect()
    }

    /// `path` no longer backs `key`. Delete the key, unless another file
    /// still declares it, in which case that file becomes the source.
    fn release_key(
        &mut self,
        key: &str,
        path: &Path,
        store: &RecordStore<R>,
    ) -> Option<UpdateEvent<R>> {
        if let Some(other) = self.index.other_path_for(key, path) {
            debug!(key = %key, source = ?other, "key still declared by another file");
            return self.refresh_from(&other, key, store);
        }

        match store.get(key) {
            Some(last) => Some(UpdateEvent::new(UpdateKind::Deleted, last, path)),
            None => {
                debug!(key = %key, "released key was not cached");
                None
            }
        }
    }

    fn refresh_from(
        &mut self,
        path: &Path,
        key: &str,
        store: &RecordStore<R>,
    ) -> Option<UpdateEvent<R>> {
        let bytes = match self.fs.read(path) {
            Ok(b) => b,
            Err(source) => {
                self.report(&LiveConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
                return None;
            }
        };
        let record = match self.parser.parse(&bytes) {
            Ok(r) => r,
            Err(source) => {
                self.report(&LiveConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                });
                return None;
            }
        };

        // That file changed key too; its own event will sort it out.
        if record.key() != key {
            return None;
        }

        self.index.record(path, key, fingerprint(&bytes));
        match store.get(key) {
            Some(current) if current == record => None,
            Some(_) => Some(UpdateEvent::new(UpdateKind::Modified, record, path)),
            None => Some(UpdateEvent::new(UpdateKind::Created, record, path)),
        }
    }
}
