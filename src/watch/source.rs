// src/watch/source.rs

use std::any::Any;
use std::fmt;
use std::path::Path;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

use crate::watch::events::{signals_from_notify, RawSignal};

/// A live change subscription for one directory.
///
/// Owns the receiving end of the raw signal stream and whatever keeps the
/// producer alive. Dropping it ends the subscription for good; a new one
/// has to be requested from the [`ChangeSource`].
pub struct Subscription {
    pub signals: mpsc::UnboundedReceiver<RawSignal>,
    _guard: Box<dyn Any + Send>,
}

impl Subscription {
    pub fn new(signals: mpsc::UnboundedReceiver<RawSignal>, guard: impl Any + Send) -> Self {
        Self {
            signals,
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Something that can subscribe to changes in a directory.
///
/// Production code uses [`NotifySource`]; tests provide their own source and
/// push raw signals by hand.
pub trait ChangeSource: Send + 'static {
    /// Start delivering raw signals for entries directly inside `dir`.
    fn subscribe(&mut self, dir: &Path) -> Result<Subscription, notify::Error>;
}

/// Non-recursive OS notifications through `notify`'s recommended backend.
#[derive(Debug, Clone, Default)]
pub struct NotifySource {
    config: Config,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(&mut self, dir: &Path) -> Result<Subscription, notify::Error> {
        // Channel from the blocking notify callback into the async world.
        let (signal_tx, signal_rx) = mpsc::unbounded_channel::<RawSignal>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let signals = match res {
                    Ok(event) => signals_from_notify(event),
                    Err(err) => vec![RawSignal::Error(err)],
                };
                for signal in signals {
                    // Receiver gone means the subscription was dropped.
                    if signal_tx.send(signal).is_err() {
                        return;
                    }
                }
            },
            self.config,
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        info!("file watcher started on {:?}", dir);

        Ok(Subscription::new(signal_rx, watcher))
    }
}
