// src/engine/mod.rs

//! Applying classified updates.
//!
//! This module ties together:
//! - the listener registry and the store mutation ([`dispatch`]),
//! - the synchronous per-event core ([`core`]),
//! - the async loop that drains the change subscription, retries it when it
//!   breaks and reports health ([`runtime`]).

pub mod core;
pub mod dispatch;
pub mod runtime;

pub use core::Engine;
pub use dispatch::{Dispatcher, Listener};
pub use runtime::Runtime;
