// src/config/validate.rs

use globset::Glob;

use crate::config::model::{RawSettingsFile, RetrySection, SettingsFile, WatchSection};
use crate::errors::{LiveConfigError, Result};

impl TryFrom<RawSettingsFile> for SettingsFile {
    type Error = LiveConfigError;

    fn try_from(mut raw: RawSettingsFile) -> std::result::Result<Self, Self::Error> {
        raw.watch.extension = raw.watch.extension.trim().trim_start_matches('.').to_string();
        validate_settings(&raw)?;
        Ok(SettingsFile::new_unchecked(raw.watch, raw.retry))
    }
}

/// Check a raw settings file. Extension normalization happens in `TryFrom`;
/// this only rejects.
pub fn validate_settings(raw: &RawSettingsFile) -> Result<()> {
    validate_watch(&raw.watch)?;
    validate_retry(&raw.retry)?;
    Ok(())
}

fn validate_watch(watch: &WatchSection) -> Result<()> {
    let ext = watch.extension.trim_start_matches('.');
    if ext.is_empty() {
        return Err(LiveConfigError::ConfigError(
            "[watch].extension must not be empty".to_string(),
        ));
    }
    if ext.contains(['/', '\\']) {
        return Err(LiveConfigError::ConfigError(format!(
            "[watch].extension must be a bare extension (got {ext:?})"
        )));
    }
    // Path::extension() never contains a dot, so "draft.json" would match nothing.
    if ext.contains('.') {
        return Err(LiveConfigError::ConfigError(format!(
            "[watch].extension must be a single extension without dots (got {ext:?})"
        )));
    }

    for pattern in &watch.exclude {
        if let Err(err) = Glob::new(pattern) {
            return Err(LiveConfigError::ConfigError(format!(
                "[watch].exclude has invalid glob {pattern:?}: {err}"
            )));
        }
    }

    Ok(())
}

fn validate_retry(retry: &RetrySection) -> Result<()> {
    if retry.initial_backoff_ms == 0 {
        return Err(LiveConfigError::ConfigError(
            "[retry].initial_backoff_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if retry.max_backoff_ms < retry.initial_backoff_ms {
        return Err(LiveConfigError::ConfigError(format!(
            "[retry].max_backoff_ms ({}) must be >= initial_backoff_ms ({})",
            retry.max_backoff_ms, retry.initial_backoff_ms
        )));
    }
    Ok(())
}
