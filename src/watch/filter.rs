// src/watch/filter.rs

//! Which directory entries count as configuration files.
//!
//! The same filter is applied to the initial scan and to live events, so a
//! file the scan would skip never enters the cache through a later event.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchSection;

#[derive(Clone)]
pub struct ConfigFileFilter {
    extension: String,
    include_hidden: bool,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for ConfigFileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFileFilter")
            .field("extension", &self.extension)
            .field("include_hidden", &self.include_hidden)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigFileFilter {
    /// `*.json`, hidden files skipped, nothing excluded.
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            include_hidden: false,
            exclude_set: None,
        }
    }
}

impl ConfigFileFilter {
    pub fn new(extension: &str, exclude: &[String], include_hidden: bool) -> Result<Self> {
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            extension: extension.trim_start_matches('.').to_string(),
            include_hidden,
            exclude_set,
        })
    }

    pub fn from_settings(watch: &WatchSection) -> Result<Self> {
        Self::new(&watch.extension, &watch.exclude, watch.include_hidden)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Name-based check only; whether the path is a regular file is up to
    /// the caller.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        if path.extension().and_then(OsStr::to_str) != Some(self.extension.as_str()) {
            return false;
        }

        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(name) {
                return false;
            }
        }

        true
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
