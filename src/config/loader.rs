// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawSettingsFile, SettingsFile};
use crate::errors::Result;

/// Load a settings file and return the raw `RawSettingsFile`.
///
/// This only performs TOML deserialization; it does **not** validate. Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettingsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: RawSettingsFile = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Normalizes the extension and checks that exclude globs compile and the
///   retry backoff is sane.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SettingsFile> {
    let raw = load_from_path(&path)?;
    let settings = SettingsFile::try_from(raw)?;
    Ok(settings)
}

/// `liveconfig.toml` in the current working directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("liveconfig.toml")
}
