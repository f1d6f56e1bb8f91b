// src/errors.rs

//! Crate-wide error type, result alias and the collaborator error sink.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum LiveConfigError {
    /// The watched directory could not be opened or enumerated.
    #[error("cannot read config directory {path:?}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The change notification subscription could not be established.
    #[error("cannot watch config directory {path:?}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LiveConfigError {
    /// Path of the file or directory this error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LiveConfigError::DirectoryUnreadable { path, .. }
            | LiveConfigError::Subscribe { path, .. }
            | LiveConfigError::Read { path, .. }
            | LiveConfigError::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LiveConfigError>;

/// Receiver for non-fatal, per-file failures.
///
/// The controller never aborts because one file is broken; it hands the
/// failure to a sink and keeps the last good value for that key.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &LiveConfigError);
}

impl<F> ErrorSink for F
where
    F: Fn(&LiveConfigError) + Send + Sync,
{
    fn report(&self, error: &LiveConfigError) {
        self(error)
    }
}

/// Default sink: log and move on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &LiveConfigError) {
        warn!(path = ?error.path(), error = %error, "config file skipped");
    }
}
