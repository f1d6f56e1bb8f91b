// src/types.rs

use std::fmt;
use std::path::PathBuf;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// A key that was absent is now present.
    Created,
    /// A present key now has a different value.
    Modified,
    /// A present key is gone. The event carries its last known value.
    Deleted,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateKind::Created => "created",
            UpdateKind::Modified => "modified",
            UpdateKind::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// A semantic, record-level change derived from filesystem activity.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEvent<R> {
    pub kind: UpdateKind,
    /// New value for `Created`/`Modified`, last cached value for `Deleted`.
    pub record: R,
    /// Backing file the change was observed on.
    pub path: PathBuf,
}

impl<R> UpdateEvent<R> {
    pub fn new(kind: UpdateKind, record: R, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            record,
            path: path.into(),
        }
    }
}

/// State of the background watch task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchHealth {
    /// Subscribed and applying updates.
    Running,
    /// The subscription failed; resubscribing. Updates are paused.
    Degraded { attempt: u32, last_error: String },
    /// No further updates will be applied.
    Stopped { reason: String },
}

impl WatchHealth {
    pub fn is_running(&self) -> bool {
        matches!(self, WatchHealth::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, WatchHealth::Stopped { .. })
    }
}
