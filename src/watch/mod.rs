// src/watch/mod.rs

//! File watching and change classification.
//!
//! This module is responsible for:
//! - Deciding which directory entries are configuration files.
//! - The initial directory scan.
//! - Subscribing to filesystem notifications (`notify`) for one directory.
//! - Turning raw notifications into created / modified / deleted updates,
//!   including the path -> key bookkeeping deletions depend on.
//!
//! It does **not** mutate the record store or call listeners; that is the
//! engine's job.

pub mod classify;
pub mod events;
pub mod filter;
pub mod hash;
pub mod index;
pub mod scan;
pub mod source;

pub use classify::Classifier;
pub use events::{RawEvent, RawKind, RawOps, RawSignal};
pub use filter::ConfigFileFilter;
pub use hash::fingerprint;
pub use index::{IndexEntry, PathIndex};
pub use scan::{load_all, ScanReport};
pub use source::{ChangeSource, NotifySource, Subscription};
