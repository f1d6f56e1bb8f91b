use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use liveconfig::watch::{ChangeSource, RawEvent, RawSignal, Subscription};

#[derive(Default)]
struct Shared {
    sender: Option<mpsc::UnboundedSender<RawSignal>>,
    subscribed_dirs: Vec<PathBuf>,
    failures_left: u32,
}

/// A change source driven by hand:
/// - every `subscribe` call is recorded,
/// - it can be told to fail the next N subscribe calls,
/// - raw events, rescans and errors are pushed through a [`FakeSourceHandle`].
pub struct FakeChangeSource {
    shared: Arc<Mutex<Shared>>,
}

/// Test-side end of a [`FakeChangeSource`]. Stays valid across
/// resubscriptions; it always talks to the newest subscription.
#[derive(Clone)]
pub struct FakeSourceHandle {
    shared: Arc<Mutex<Shared>>,
}

impl FakeChangeSource {
    pub fn new() -> (Self, FakeSourceHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            FakeSourceHandle { shared },
        )
    }
}

impl ChangeSource for FakeChangeSource {
    fn subscribe(&mut self, dir: &Path) -> Result<Subscription, notify::Error> {
        let mut shared = self.shared.lock().unwrap();
        shared.subscribed_dirs.push(dir.to_path_buf());
        if shared.failures_left > 0 {
            shared.failures_left -= 1;
            return Err(notify::Error::generic("fake subscribe failure"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        shared.sender = Some(tx);
        Ok(Subscription::new(rx, ()))
    }
}

impl FakeSourceHandle {
    /// Push a raw signal. Returns false when no subscription is live.
    pub fn send(&self, signal: RawSignal) -> bool {
        let shared = self.shared.lock().unwrap();
        match &shared.sender {
            Some(tx) => tx.send(signal).is_ok(),
            None => false,
        }
    }

    pub fn event(&self, event: RawEvent) -> bool {
        self.send(RawSignal::Event(event))
    }

    pub fn write(&self, path: impl Into<PathBuf>) -> bool {
        self.event(RawEvent::write(path))
    }

    pub fn create(&self, path: impl Into<PathBuf>) -> bool {
        self.event(RawEvent::create(path))
    }

    pub fn remove(&self, path: impl Into<PathBuf>) -> bool {
        self.event(RawEvent::remove(path))
    }

    pub fn rescan(&self) -> bool {
        self.send(RawSignal::Rescan)
    }

    /// Deliver a backend error on the live subscription.
    pub fn error(&self, message: &str) -> bool {
        self.send(RawSignal::Error(notify::Error::generic(message)))
    }

    /// End the live subscription's stream.
    pub fn close(&self) {
        self.shared.lock().unwrap().sender = None;
    }

    /// Make the next `n` subscribe calls fail.
    pub fn fail_next_subscribes(&self, n: u32) {
        self.shared.lock().unwrap().failures_left = n;
    }

    /// Number of subscribe calls so far, failed ones included.
    pub fn subscribe_calls(&self) -> usize {
        self.shared.lock().unwrap().subscribed_dirs.len()
    }

    pub fn subscribed_dirs(&self) -> Vec<PathBuf> {
        self.shared.lock().unwrap().subscribed_dirs.clone()
    }
}
