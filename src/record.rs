// src/record.rs

//! The record capability the watch engine is generic over, plus the stock
//! byte parsers.
//!
//! The engine never looks inside a record. It needs exactly three things:
//! - a key the record declares for itself (the file name is irrelevant),
//! - value equality, to recognise a save that changed nothing,
//! - a parser turning file bytes into a record.

use std::fmt;
use std::marker::PhantomData;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// A keyed, comparable configuration value.
///
/// `PartialEq` must compare every field: it decides whether a filesystem
/// event is reported as a modification or silently dropped.
pub trait Record: Clone + PartialEq + Send + Sync + 'static {
    /// Self-declared unique identifier.
    fn key(&self) -> &str;
}

/// Turns the raw contents of one configuration file into a record.
pub trait RecordParser<R>: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<R>;
}

impl<R, F> RecordParser<R> for F
where
    F: Fn(&[u8]) -> Result<R> + Send + Sync,
{
    fn parse(&self, bytes: &[u8]) -> Result<R> {
        self(bytes)
    }
}

/// JSON parser for any deserializable record type.
pub struct JsonParser<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonParser<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R> Default for JsonParser<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for JsonParser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonParser")
    }
}

impl<R: DeserializeOwned> RecordParser<R> for JsonParser<R> {
    fn parse(&self, bytes: &[u8]) -> Result<R> {
        serde_json::from_slice(bytes).context("invalid JSON record")
    }
}

/// TOML parser for any deserializable record type.
pub struct TomlParser<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R> TomlParser<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<R> Default for TomlParser<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for TomlParser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TomlParser")
    }
}

impl<R: DeserializeOwned> RecordParser<R> for TomlParser<R> {
    fn parse(&self, bytes: &[u8]) -> Result<R> {
        let text = std::str::from_utf8(bytes).context("TOML record is not valid UTF-8")?;
        toml::from_str(text).context("invalid TOML record")
    }
}
