// src/controller.rs

//! Public entry point: a hot-reloaded, read-mostly view of a config directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use tokio::sync::{watch, Notify};
use tracing::info;

use crate::config::SettingsFile;
use crate::engine::{Dispatcher, Engine, Runtime};
use crate::errors::{ErrorSink, LiveConfigError, LogErrorSink, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::record::{JsonParser, Record, RecordParser};
use crate::store::RecordStore;
use crate::types::{UpdateEvent, UpdateKind, WatchHealth};
use crate::watch::{ChangeSource, Classifier, ConfigFileFilter, NotifySource, ScanReport};

/// Open `dir` with default settings and JSON records.
///
/// Must be called from inside a Tokio runtime.
pub fn open<R>(dir: impl Into<PathBuf>) -> Result<Controller<R>>
where
    R: Record + DeserializeOwned,
{
    ControllerBuilder::new(dir, JsonParser::new()).open()
}

/// Configures and opens a [`Controller`].
///
/// Listeners added here are in place before the initial load, so with
/// `replay_initial` they see every initially loaded record as `Created`.
pub struct ControllerBuilder<R: Record> {
    directory: PathBuf,
    settings: SettingsFile,
    parser: Arc<dyn RecordParser<R>>,
    fs: Arc<dyn FileSystem>,
    errors: Arc<dyn ErrorSink>,
    dispatcher: Arc<Dispatcher<R>>,
}

impl<R: Record> fmt::Debug for ControllerBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBuilder")
            .field("directory", &self.directory)
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<R: Record> ControllerBuilder<R> {
    pub fn new(directory: impl Into<PathBuf>, parser: impl RecordParser<R> + 'static) -> Self {
        Self {
            directory: directory.into(),
            settings: SettingsFile::default(),
            parser: Arc::new(parser),
            fs: Arc::new(RealFileSystem),
            errors: Arc::new(LogErrorSink),
            dispatcher: Arc::new(Dispatcher::new()),
        }
    }

    /// Directory comes from `[watch].directory`.
    pub fn from_settings(settings: SettingsFile, parser: impl RecordParser<R> + 'static) -> Self {
        let directory = settings.watch().directory.clone();
        Self::new(directory, parser).settings(settings)
    }

    /// Replace the settings. The directory given to [`Self::new`] is kept.
    pub fn settings(mut self, settings: SettingsFile) -> Self {
        self.settings = settings;
        self
    }

    pub fn filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.errors = Arc::new(sink);
        self
    }

    pub fn global_listener<F>(self, listener: F) -> Self
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.dispatcher.add_global(listener);
        self
    }

    pub fn scoped_listener<F>(self, key: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.dispatcher.add_scoped(key, listener);
        self
    }

    /// Load the directory and start watching it with OS notifications.
    pub fn open(self) -> Result<Controller<R>> {
        self.open_with_source(NotifySource::new())
    }

    /// Load the directory and start watching it with `source`.
    ///
    /// The subscription is established before the scan. Changes landing
    /// while the scan runs are queued and classified afterwards; for files
    /// the scan already picked up they compare equal and are dropped, so
    /// nothing in that window is lost or reported twice.
    pub fn open_with_source<S: ChangeSource>(self, mut source: S) -> Result<Controller<R>> {
        let filter = ConfigFileFilter::from_settings(self.settings.watch())
            .map_err(|e| LiveConfigError::ConfigError(format!("{e:#}")))?;

        if !self.fs.is_dir(&self.directory) {
            return Err(LiveConfigError::DirectoryUnreadable {
                path: self.directory.clone(),
                source: anyhow!("not a directory"),
            });
        }
        let dir = self
            .fs
            .canonicalize(&self.directory)
            .map_err(|source| LiveConfigError::DirectoryUnreadable {
                path: self.directory.clone(),
                source,
            })?;

        let subscription = source
            .subscribe(&dir)
            .map_err(|source| LiveConfigError::Subscribe {
                path: dir.clone(),
                source,
            })?;

        let mut classifier = Classifier::new(
            Arc::clone(&self.fs),
            filter,
            Arc::clone(&self.parser),
            Arc::clone(&self.errors),
        );
        let ScanReport {
            records,
            index,
            errors,
        } = classifier.rescan(&dir)?;
        for error in &errors {
            self.errors.report(error);
        }

        let store = Arc::new(RecordStore::new());
        store.replace_all(records);

        if self.settings.watch().replay_initial {
            let mut initial = store.list();
            initial.sort_by(|a, b| a.key().cmp(b.key()));
            for record in initial {
                let path = index.path_for(record.key()).unwrap_or_else(|| dir.clone());
                self.dispatcher
                    .notify(&UpdateEvent::new(UpdateKind::Created, record, path));
            }
        }
        classifier.replace_index(index);

        info!(dir = ?dir, records = store.len(), failed = errors.len(), "config directory loaded");

        let (health_tx, health_rx) = watch::channel(WatchHealth::Running);
        let shutdown = Arc::new(Notify::new());

        let engine = Engine::new(
            dir.clone(),
            classifier,
            Arc::clone(&store),
            Arc::clone(&self.dispatcher),
        );
        let runtime = Runtime::new(
            engine,
            source,
            subscription,
            self.settings.retry().clone(),
            health_tx,
            Arc::clone(&shutdown),
        );
        tokio::spawn(runtime.run());

        Ok(Controller {
            store,
            dispatcher: self.dispatcher,
            health: health_rx,
            shutdown,
            directory: dir,
            load_errors: Arc::new(errors),
        })
    }
}

/// Handle to a watched config directory. Cheap to clone; all clones share
/// the same cache and listeners.
pub struct Controller<R: Record> {
    store: Arc<RecordStore<R>>,
    dispatcher: Arc<Dispatcher<R>>,
    health: watch::Receiver<WatchHealth>,
    shutdown: Arc<Notify>,
    directory: PathBuf,
    load_errors: Arc<Vec<LiveConfigError>>,
}

impl<R: Record> Clone for Controller<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: Arc::clone(&self.dispatcher),
            health: self.health.clone(),
            shutdown: Arc::clone(&self.shutdown),
            directory: self.directory.clone(),
            load_errors: Arc::clone(&self.load_errors),
        }
    }
}

impl<R: Record> fmt::Debug for Controller<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("directory", &self.directory)
            .field("records", &self.store.len())
            .field("health", &*self.health.borrow())
            .finish_non_exhaustive()
    }
}

impl<R: Record> Controller<R> {
    /// Current value for `key`, as an independent copy.
    pub fn get(&self, key: &str) -> Option<R> {
        self.store.get(key)
    }

    /// Copies of all current records, in no particular order.
    pub fn list(&self) -> Vec<R> {
        self.store.list()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// See [`crate::engine::Listener`] for the blocking contract.
    pub fn add_global_listener<F>(&self, listener: F)
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.dispatcher.add_global(listener);
    }

    pub fn add_scoped_listener<F>(&self, key: impl Into<String>, listener: F)
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.dispatcher.add_scoped(key, listener);
    }

    /// Files skipped during the initial load.
    pub fn load_errors(&self) -> &[LiveConfigError] {
        &self.load_errors
    }

    /// Canonical path of the watched directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn health(&self) -> WatchHealth {
        self.health.borrow().clone()
    }

    pub fn health_updates(&self) -> watch::Receiver<WatchHealth> {
        self.health.clone()
    }

    /// Stop the background watch task. The cache keeps its last contents.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}
