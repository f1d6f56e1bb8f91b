// src/engine/dispatch.rs

//! Listener registry and update application.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::record::Record;
use crate::store::RecordStore;
use crate::types::{UpdateEvent, UpdateKind};

/// Callback invoked once per update event.
///
/// Listeners run on the watch task, one after another, before the next
/// event is looked at. A slow listener delays every later update; hand
/// heavy work off to your own task or thread.
pub type Listener<R> = Arc<dyn Fn(&UpdateEvent<R>) + Send + Sync>;

struct Listeners<R> {
    global: Vec<Listener<R>>,
    scoped: HashMap<String, Vec<Listener<R>>>,
}

/// Applies updates to the store and fans them out to listeners.
///
/// Registration is append-only and allowed at any time, including from
/// inside a listener; a listener added during a dispatch is first called
/// for the next event.
pub struct Dispatcher<R> {
    listeners: RwLock<Listeners<R>>,
}

impl<R> fmt::Debug for Dispatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Dispatcher")
            .field("global", &l.global.len())
            .field("scoped_keys", &l.scoped.len())
            .finish()
    }
}

impl<R> Default for Dispatcher<R> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Listeners {
                global: Vec::new(),
                scoped: HashMap::new(),
            }),
        }
    }
}

impl<R: Record> Dispatcher<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every update, before any scoped listener.
    pub fn add_global<F>(&self, listener: F)
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .global
            .push(Arc::new(listener));
    }

    /// Called only for updates whose record key is `key`.
    pub fn add_scoped<F>(&self, key: impl Into<String>, listener: F)
    where
        F: Fn(&UpdateEvent<R>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .scoped
            .entry(key.into())
            .or_default()
            .push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        let l = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        l.global.len() + l.scoped.values().map(Vec::len).sum::<usize>()
    }

    /// Mutate the store for `event`, then notify. Listeners calling back
    /// into the store observe the post-update state.
    pub(crate) fn apply(&self, store: &RecordStore<R>, event: UpdateEvent<R>) {
        match event.kind {
            UpdateKind::Created | UpdateKind::Modified => {
                store.upsert(event.record.clone());
            }
            UpdateKind::Deleted => {
                store.remove(event.record.key());
            }
        }
        self.notify(&event);
    }

    /// Global listeners in registration order, then the scoped listeners
    /// for the event's key in registration order.
    pub(crate) fn notify(&self, event: &UpdateEvent<R>) {
        let (global, scoped) = {
            let l = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            let scoped = l
                .scoped
                .get(event.record.key())
                .cloned()
                .unwrap_or_default();
            (l.global.clone(), scoped)
        };

        debug!(
            key = %event.record.key(),
            kind = %event.kind,
            global = global.len(),
            scoped = scoped.len(),
            "dispatching update"
        );

        for listener in global.iter().chain(scoped.iter()) {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                warn!(
                    key = %event.record.key(),
                    kind = %event.kind,
                    "update listener panicked: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
