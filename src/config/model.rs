// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::gamemode::DEFAULT_GAMEMODE_DIR;

/// Settings as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// directory = "./config/gamemodes"
/// extension = "json"
/// exclude = ["*.draft.json"]
///
/// [retry]
/// max_attempts = 5
/// initial_backoff_ms = 100
/// max_backoff_ms = 5000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettingsFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub retry: RetrySection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Flat directory holding one record per file.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Recognized configuration file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns matched against the file name; matches are ignored.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Treat dot-files as configuration files too.
    #[serde(default)]
    pub include_hidden: bool,

    /// Deliver a synthetic `Created` for each initially loaded record to
    /// listeners registered before `open`.
    #[serde(default)]
    pub replay_initial: bool,
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_GAMEMODE_DIR)
}

fn default_extension() -> String {
    "json".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            extension: default_extension(),
            exclude: Vec::new(),
            include_hidden: false,
            replay_initial: false,
        }
    }
}

/// `[retry]` section: what to do when the change subscription breaks.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Resubscription attempts before giving up. `0` stops on first failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySection {
    /// Delay before resubscription attempt `attempt` (1-based): doubles each
    /// time, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Validated settings. Obtain through `TryFrom<RawSettingsFile>` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct SettingsFile {
    watch: WatchSection,
    retry: RetrySection,
}

impl SettingsFile {
    pub(crate) fn new_unchecked(watch: WatchSection, retry: RetrySection) -> Self {
        Self { watch, retry }
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn retry(&self) -> &RetrySection {
        &self.retry
    }

    /// Same settings, different directory (CLI `--dir`).
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.watch.directory = directory.into();
        self
    }
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self::new_unchecked(WatchSection::default(), RetrySection::default())
    }
}
