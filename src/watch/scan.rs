// src/watch/scan.rs

//! One-shot directory scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{LiveConfigError, Result};
use crate::fs::FileSystem;
use crate::record::{Record, RecordParser};
use crate::watch::filter::ConfigFileFilter;
use crate::watch::hash::fingerprint;
use crate::watch::index::PathIndex;

/// Result of scanning a directory.
#[derive(Debug)]
pub struct ScanReport<R> {
    /// Key -> record for every file that parsed.
    pub records: HashMap<String, R>,
    /// Path -> key for the same files (duplicates included).
    pub index: PathIndex,
    /// Files that could not be read or parsed. They are not in `records`.
    pub errors: Vec<LiveConfigError>,
}

impl<R> ScanReport<R> {
    /// Paths that failed, in scan order.
    pub fn failed_paths(&self) -> Vec<&Path> {
        self.errors.iter().filter_map(|e| e.path()).collect()
    }
}

/// Load every configuration file directly inside `dir`.
///
/// Directories, files without the configured extension, hidden files and
/// excluded names are skipped. A file that fails to read or parse is
/// reported in [`ScanReport::errors`] and the scan goes on; only failing to
/// enumerate `dir` itself is an error.
///
/// Entries are visited in path order. When two files declare the same key
/// the later one wins, so the winner is stable across runs.
pub fn load_all<R: Record>(
    fs: &dyn FileSystem,
    dir: &Path,
    filter: &ConfigFileFilter,
    parser: &dyn RecordParser<R>,
) -> Result<ScanReport<R>> {
    let mut entries =
        fs.read_dir(dir)
            .map_err(|source| LiveConfigError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source,
            })?;
    entries.sort();

    let mut report = ScanReport {
        records: HashMap::new(),
        index: PathIndex::new(),
        errors: Vec::new(),
    };
    let mut origin: HashMap<String, PathBuf> = HashMap::new();

    for path in entries {
        if !filter.matches(&path) || !fs.is_file(&path) {
            debug!(?path, "skipping non-config entry");
            continue;
        }

        let bytes = match fs.read(&path) {
            Ok(b) => b,
            Err(source) => {
                report.errors.push(LiveConfigError::Read { path, source });
                continue;
            }
        };

        let record = match parser.parse(&bytes) {
            Ok(r) => r,
            Err(source) => {
                report.errors.push(LiveConfigError::Parse { path, source });
                continue;
            }
        };

        let key = record.key().to_string();
        if let Some(previous) = origin.insert(key.clone(), path.clone()) {
            warn!(
                key = %key,
                kept = ?path,
                dropped = ?previous,
                "duplicate config key; later file wins"
            );
        }
        report.index.record(&path, key.clone(), fingerprint(&bytes));
        report.records.insert(key, record);
    }

    info!(
        dir = ?dir,
        loaded = report.records.len(),
        failed = report.errors.len(),
        "initial config scan complete"
    );

    Ok(report)
}
