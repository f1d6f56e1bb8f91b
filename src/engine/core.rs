// src/engine/core.rs

//! Synchronous core of the watch loop.
//!
//! [`Engine`] takes one raw event at a time, classifies it and applies the
//! resulting updates. It has no channels and no Tokio types, so it can be
//! driven directly from tests; the async shell in [`super::runtime`] only
//! feeds it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::record::Record;
use crate::store::RecordStore;
use crate::types::{UpdateEvent, UpdateKind};
use crate::watch::classify::Classifier;
use crate::watch::events::RawEvent;
use crate::watch::scan::ScanReport;

use super::dispatch::Dispatcher;

/// The single writer of the record store.
pub struct Engine<R: Record> {
    dir: PathBuf,
    classifier: Classifier<R>,
    store: Arc<RecordStore<R>>,
    dispatcher: Arc<Dispatcher<R>>,
}

impl<R: Record> fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("records", &self.store.len())
            .field("tracked_paths", &self.classifier.index().len())
            .finish_non_exhaustive()
    }
}

impl<R: Record> Engine<R> {
    pub fn new(
        dir: impl Into<PathBuf>,
        classifier: Classifier<R>,
        store: Arc<RecordStore<R>>,
        dispatcher: Arc<Dispatcher<R>>,
    ) -> Self {
        Self {
            dir: dir.into(),
            classifier,
            store,
            dispatcher,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &Arc<RecordStore<R>> {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier<R> {
        &self.classifier
    }

    /// Handle one raw event. Returns how many updates were dispatched.
    pub fn step(&mut self, event: &RawEvent) -> usize {
        let updates = self.classifier.classify(event, &self.store);
        let count = updates.len();
        for update in updates {
            self.dispatcher.apply(&self.store, update);
        }
        count
    }

    /// Rescan the directory and dispatch whatever differs from the store.
    ///
    /// Used after events may have been lost (backend overflow, lost
    /// subscription). A file that exists but now fails to parse keeps its
    /// cached value, exactly as it would for a live event.
    pub fn reconcile(&mut self) -> Result<usize> {
        let ScanReport {
            records,
            mut index,
            errors,
        } = self.classifier.rescan(&self.dir)?;

        let mut protected: HashSet<String> = HashSet::new();
        for error in &errors {
            self.classifier.report(error);
            let Some(path) = error.path() else { continue };
            if let Some(entry) = self.classifier.index().get(path) {
                protected.insert(entry.key.clone());
                index.record(path, entry.key.clone(), entry.fingerprint.clone());
            }
        }

        let mut updates = Vec::new();

        let mut fresh: Vec<(String, R)> = records.into_iter().collect();
        fresh.sort_by(|a, b| a.0.cmp(&b.0));
        let fresh_keys: HashSet<String> = fresh.iter().map(|(k, _)| k.clone()).collect();

        for (key, record) in fresh {
            let path = index.path_for(&key).unwrap_or_else(|| self.dir.clone());
            match self.store.get(&key) {
                None => updates.push(UpdateEvent::new(UpdateKind::Created, record, path)),
                Some(current) if current != record => {
                    updates.push(UpdateEvent::new(UpdateKind::Modified, record, path))
                }
                Some(_) => {}
            }
        }

        for key in self.store.keys() {
            if fresh_keys.contains(&key) || protected.contains(&key) {
                continue;
            }
            if let Some(last) = self.store.get(&key) {
                let path = self
                    .classifier
                    .index()
                    .path_for(&key)
                    .unwrap_or_else(|| self.dir.clone());
                updates.push(UpdateEvent::new(UpdateKind::Deleted, last, path));
            }
        }

        self.classifier.replace_index(index);

        let count = updates.len();
        debug!(updates = count, "reconciled store with directory");
        for update in updates {
            self.dispatcher.apply(&self.store, update);
        }
        Ok(count)
    }
}
