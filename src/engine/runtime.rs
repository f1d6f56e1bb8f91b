// src/engine/runtime.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::RetrySection;
use crate::record::Record;
use crate::types::WatchHealth;
use crate::watch::events::RawSignal;
use crate::watch::source::{ChangeSource, Subscription};

use super::core::Engine;

/// Drains a change subscription into the [`Engine`].
///
/// This is the async shell: it owns the subscription, resubscribes with
/// backoff when the source fails, publishes health, and stops on
/// shutdown. Event processing itself is strictly sequential.
///
/// The engine reads files and calls listeners synchronously, so every
/// step runs on the blocking pool. The engine is moved there and back,
/// and is `None` only while a step is in flight.
pub struct Runtime<R: Record, S: ChangeSource> {
    dir: PathBuf,
    engine: Option<Engine<R>>,
    source: S,
    subscription: Subscription,
    retry: RetrySection,
    health: watch::Sender<WatchHealth>,
    shutdown: Arc<Notify>,
}

impl<R: Record, S: ChangeSource> fmt::Debug for Runtime<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("dir", &self.dir)
            .field("engine", &self.engine)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

enum Next {
    Signal(Option<RawSignal>),
    Shutdown,
}

impl<R: Record, S: ChangeSource> Runtime<R, S> {
    pub fn new(
        engine: Engine<R>,
        source: S,
        subscription: Subscription,
        retry: RetrySection,
        health: watch::Sender<WatchHealth>,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            dir: engine.dir().to_path_buf(),
            engine: Some(engine),
            source,
            subscription,
            retry,
            health,
            shutdown,
        }
    }

    /// Main loop. Returns when shut down or when resubscription gives up.
    pub async fn run(mut self) {
        info!(dir = ?self.dir, "liveconfig watch loop started");
        self.set_health(WatchHealth::Running);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.notified() => Next::Shutdown,
                signal = self.subscription.signals.recv() => Next::Signal(signal),
            };

            match next {
                Next::Shutdown => {
                    info!("shutdown requested; stopping watch loop");
                    self.set_health(WatchHealth::Stopped {
                        reason: "closed".to_string(),
                    });
                    return;
                }
                Next::Signal(Some(RawSignal::Event(event))) => {
                    debug!(?event, "received raw event");
                    if self.with_engine(move |engine| engine.step(&event)).await.is_none() {
                        self.engine_lost();
                        return;
                    }
                }
                Next::Signal(Some(RawSignal::Rescan)) => {
                    warn!("change source dropped events; rescanning");
                    if !self.reconcile().await {
                        return;
                    }
                }
                Next::Signal(Some(RawSignal::Error(err))) => {
                    error!(error = %err, "change subscription failed");
                    if !self.resubscribe(err.to_string()).await {
                        return;
                    }
                }
                Next::Signal(None) => {
                    warn!("change subscription closed unexpectedly");
                    if !self.resubscribe("subscription closed".to_string()).await {
                        return;
                    }
                }
            }
        }
    }

    /// Try to get a fresh subscription. On success the directory is
    /// rescanned, since anything that happened in between was missed.
    async fn resubscribe(&mut self, mut last_error: String) -> bool {
        for attempt in 1..=self.retry.max_attempts {
            self.set_health(WatchHealth::Degraded {
                attempt,
                last_error: last_error.clone(),
            });

            let delay = self.retry.backoff(attempt);
            debug!(attempt, ?delay, "waiting before resubscribing");
            tokio::select! {
                _ = sleep(delay) => {}
                _ = self.shutdown.notified() => {
                    info!("shutdown requested while resubscribing");
                    self.set_health(WatchHealth::Stopped {
                        reason: "closed".to_string(),
                    });
                    return false;
                }
            }

            match self.source.subscribe(&self.dir) {
                Ok(subscription) => {
                    self.subscription = subscription;
                    info!(attempt, "change subscription re-established");
                    if !self.reconcile().await {
                        return false;
                    }
                    self.set_health(WatchHealth::Running);
                    return true;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "resubscribe failed");
                    last_error = err.to_string();
                }
            }
        }

        error!(
            attempts = self.retry.max_attempts,
            error = %last_error,
            "giving up on change subscription; updates stopped"
        );
        self.set_health(WatchHealth::Stopped {
            reason: format!("change subscription lost: {last_error}"),
        });
        false
    }

    /// Returns `false` when the engine was lost and the loop must stop.
    async fn reconcile(&mut self) -> bool {
        match self.with_engine(|engine| engine.reconcile()).await {
            Some(Ok(count)) => {
                info!(updates = count, "directory rescanned");
                true
            }
            Some(Err(err)) => {
                error!(error = %err, "rescan failed; cache left as is");
                true
            }
            None => {
                self.engine_lost();
                false
            }
        }
    }

    /// Run `work` against the engine on the blocking pool, keeping the
    /// async workers free while files are read and listeners run.
    async fn with_engine<T, F>(&mut self, work: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Engine<R>) -> T + Send + 'static,
    {
        let mut engine = self.engine.take()?;
        let task = tokio::task::spawn_blocking(move || {
            let out = work(&mut engine);
            (engine, out)
        });
        match task.await {
            Ok((engine, out)) => {
                self.engine = Some(engine);
                Some(out)
            }
            Err(err) => {
                error!(error = %err, "engine step did not complete");
                None
            }
        }
    }

    fn engine_lost(&self) {
        error!("engine unavailable; updates stopped");
        self.set_health(WatchHealth::Stopped {
            reason: "engine step failed".to_string(),
        });
    }

    fn set_health(&self, health: WatchHealth) {
        self.health.send_replace(health);
    }
}
