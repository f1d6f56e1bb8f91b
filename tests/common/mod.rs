#![allow(dead_code)]

pub use liveconfig_test_utils::builders::{
    game_mode_json, replace_game_mode, write_game_mode, GameModeBuilder,
};
pub use liveconfig_test_utils::fake_source::{FakeChangeSource, FakeSourceHandle};
pub use liveconfig_test_utils::recorder::EventRecorder;
pub use liveconfig_test_utils::{init_tracing, wait_until, with_timeout};

use std::path::Path;
use std::sync::{Arc, Mutex};

use liveconfig::config::{RawSettingsFile, SettingsFile};
use liveconfig::engine::{Dispatcher, Engine};
use liveconfig::fs::mock::MockFileSystem;
use liveconfig::store::RecordStore;
use liveconfig::watch::{Classifier, ConfigFileFilter};
use liveconfig::{ErrorSink, GameModeConfig, JsonParser, LiveConfigError};

pub const DIR: &str = "/cfg";

/// Collects errors handed to the error sink, rendered as strings.
#[derive(Clone, Default)]
pub struct ErrorLog {
    errors: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn sink(&self) -> impl ErrorSink + 'static + use<> {
        let errors = Arc::clone(&self.errors);
        move |e: &LiveConfigError| errors.lock().unwrap().push(e.to_string())
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

/// An engine over a mock filesystem rooted at [`DIR`], with a recorder
/// registered as the only global listener.
pub struct Harness {
    pub fs: MockFileSystem,
    pub engine: Engine<GameModeConfig>,
    pub store: Arc<RecordStore<GameModeConfig>>,
    pub dispatcher: Arc<Dispatcher<GameModeConfig>>,
    pub recorder: EventRecorder<GameModeConfig>,
    pub errors: ErrorLog,
}

impl Harness {
    pub fn new(fs: MockFileSystem) -> Self {
        fs.add_dir(DIR);
        let errors = ErrorLog::default();
        let classifier = Classifier::new(
            Arc::new(fs.clone()),
            ConfigFileFilter::default(),
            Arc::new(JsonParser::<GameModeConfig>::new()),
            Arc::new(errors.sink()),
        );
        let store = Arc::new(RecordStore::new());
        let dispatcher = Arc::new(Dispatcher::new());
        let recorder = EventRecorder::new();
        dispatcher.add_global(recorder.listener());
        let engine = Engine::new(DIR, classifier, Arc::clone(&store), Arc::clone(&dispatcher));
        Self {
            fs,
            engine,
            store,
            dispatcher,
            recorder,
            errors,
        }
    }

    /// Start from whatever is already in the mock filesystem.
    pub fn loaded(fs: MockFileSystem) -> Self {
        let mut h = Self::new(fs);
        h.engine.reconcile().expect("initial reconcile");
        h.recorder.clear();
        h
    }

    pub fn put(&self, name: &str, mode: &GameModeConfig) -> std::path::PathBuf {
        let path = Path::new(DIR).join(name);
        self.fs.add_file(&path, game_mode_json(mode));
        path
    }

    pub fn put_raw(&self, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = Path::new(DIR).join(name);
        self.fs.add_file(&path, bytes.to_vec());
        path
    }
}

pub fn mode(id: &str) -> GameModeConfig {
    GameModeBuilder::new(id).build()
}

/// Settings with short backoffs so recovery tests finish quickly.
pub fn fast_retry_settings(max_attempts: u32) -> SettingsFile {
    let raw: RawSettingsFile = toml::from_str(&format!(
        "[retry]\nmax_attempts = {max_attempts}\ninitial_backoff_ms = 20\nmax_backoff_ms = 40\n"
    ))
    .expect("valid settings toml");
    SettingsFile::try_from(raw).expect("valid settings")
}
