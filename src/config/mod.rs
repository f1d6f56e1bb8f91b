// src/config/mod.rs

//! Settings for the config watcher.
//!
//! Responsibilities:
//! - Define the TOML-backed settings model (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate it before anything is watched (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_settings_path, load_and_validate, load_from_path};
pub use model::{RawSettingsFile, RetrySection, SettingsFile, WatchSection};
pub use validate::validate_settings;
