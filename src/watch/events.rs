// src/watch/events.rs

//! Raw filesystem signals, before classification.

use std::path::PathBuf;

use bitflags::bitflags;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;

bitflags! {
    /// Operations observed on one path in one notification.
    ///
    /// Some backends report more than one at once (write-and-create).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RawOps: u8 {
        const WRITE = 0b001;
        const CREATE = 0b010;
        const REMOVE = 0b100;
    }
}

/// The single operation a raw event is classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Write,
    Create,
    Remove,
}

impl RawOps {
    /// Precedence: write > create > remove.
    pub fn resolve(self) -> Option<RawKind> {
        if self.contains(RawOps::WRITE) {
            Some(RawKind::Write)
        } else if self.contains(RawOps::CREATE) {
            Some(RawKind::Create)
        } else if self.contains(RawOps::REMOVE) {
            Some(RawKind::Remove)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub ops: RawOps,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, ops: RawOps) -> Self {
        Self {
            path: path.into(),
            ops,
        }
    }

    pub fn write(path: impl Into<PathBuf>) -> Self {
        Self::new(path, RawOps::WRITE)
    }

    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self::new(path, RawOps::CREATE)
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self::new(path, RawOps::REMOVE)
    }
}

/// One item of a change subscription.
#[derive(Debug)]
pub enum RawSignal {
    Event(RawEvent),
    /// The backend dropped events; the directory must be rescanned.
    Rescan,
    /// The backend failed.
    Error(notify::Error),
}

/// Split a notify event into per-path raw signals.
///
/// Access and metadata-only changes carry no content change and are
/// dropped here.
pub fn signals_from_notify(event: Event) -> Vec<RawSignal> {
    if event.need_rescan() {
        return vec![RawSignal::Rescan];
    }

    let per_path = |ops: RawOps, paths: Vec<PathBuf>| -> Vec<RawSignal> {
        paths
            .into_iter()
            .map(|path| RawSignal::Event(RawEvent::new(path, ops)))
            .collect()
    };

    match event.kind {
        EventKind::Create(_) => per_path(RawOps::CREATE, event.paths),
        EventKind::Remove(_) => per_path(RawOps::REMOVE, event.paths),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            per_path(RawOps::REMOVE, event.paths)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            let mut signals = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                signals.push(RawSignal::Event(RawEvent::remove(from)));
            }
            if let Some(to) = paths.next() {
                signals.push(RawSignal::Event(RawEvent::create(to)));
            }
            signals
        }
        // Rename target, or direction unknown: the classifier checks whether
        // the file is still there.
        EventKind::Modify(ModifyKind::Name(_)) => per_path(RawOps::CREATE, event.paths),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) | EventKind::Any => per_path(RawOps::WRITE, event.paths),
        _ => Vec::new(),
    }
}
