// tests/startup_race.rs

//! Changes that land between subscribing and the initial scan must be
//! neither lost nor reported twice.

mod common;
use crate::common::{
    game_mode_json, init_tracing, mode, wait_until, EventRecorder, GameModeBuilder, DIR,
};

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use liveconfig::fs::mock::MockFileSystem;
use liveconfig::watch::{ChangeSource, RawEvent, RawSignal, Subscription};
use liveconfig::{Controller, ControllerBuilder, GameModeConfig, JsonParser, UpdateKind};

type TestResult = Result<(), Box<dyn Error>>;

type Sender = Arc<Mutex<Option<mpsc::UnboundedSender<RawSignal>>>>;

/// Runs `on_subscribe` right after subscribing and queues the events it
/// returns, so they are waiting when the watch loop starts.
struct RacingSource {
    fs: MockFileSystem,
    on_subscribe: Box<dyn FnMut(&MockFileSystem) -> Vec<RawEvent> + Send>,
    sender: Sender,
}

impl ChangeSource for RacingSource {
    fn subscribe(&mut self, _dir: &Path) -> Result<Subscription, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in (self.on_subscribe)(&self.fs) {
            let _ = tx.send(RawSignal::Event(event));
        }
        *self.sender.lock().unwrap() = Some(tx);
        Ok(Subscription::new(rx, ()))
    }
}

fn open_racing<F>(
    fs: &MockFileSystem,
    recorder: &EventRecorder<GameModeConfig>,
    on_subscribe: F,
) -> Result<(Controller<GameModeConfig>, Sender), Box<dyn Error>>
where
    F: FnMut(&MockFileSystem) -> Vec<RawEvent> + Send + 'static,
{
    let sender: Sender = Arc::new(Mutex::new(None));
    let source = RacingSource {
        fs: fs.clone(),
        on_subscribe: Box::new(on_subscribe),
        sender: Arc::clone(&sender),
    };
    let controller = ControllerBuilder::new(DIR, JsonParser::new())
        .filesystem(fs.clone())
        .global_listener(recorder.listener())
        .open_with_source(source)?;
    Ok((controller, sender))
}

fn push(sender: &Sender, event: RawEvent) {
    if let Some(tx) = sender.lock().unwrap().as_ref() {
        tx.send(RawSignal::Event(event)).unwrap();
    }
}

/// Sends a create for a marker file; once it is applied, every event queued
/// before it has been handled too.
async fn drain(fs: &MockFileSystem, sender: &Sender, controller: &Controller<GameModeConfig>) {
    fs.add_file("/cfg/zz-marker.json", game_mode_json(&mode("zz-marker")));
    push(sender, RawEvent::create("/cfg/zz-marker.json"));
    wait_until(|| controller.get("zz-marker").is_some()).await;
}

#[tokio::test]
async fn file_created_before_scan_is_reported_once() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir(DIR);

    let recorder = EventRecorder::new();
    let (controller, sender) = open_racing(&fs, &recorder, |fs| {
        fs.add_file("/cfg/a.json", game_mode_json(&mode("a")));
        vec![RawEvent::create("/cfg/a.json")]
    })?;

    // Picked up by the scan.
    assert_eq!(controller.get("a"), Some(mode("a")));

    drain(&fs, &sender, &controller).await;
    assert_eq!(
        recorder.summary(),
        vec![(UpdateKind::Created, "zz-marker".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn file_modified_before_scan_is_not_reported_again() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/cfg/a.json", game_mode_json(&mode("a")));
    let v2 = GameModeBuilder::new("a").players(2, 2).build();

    let recorder = EventRecorder::new();
    let written = v2.clone();
    let (controller, sender) = open_racing(&fs, &recorder, move |fs| {
        fs.add_file("/cfg/a.json", game_mode_json(&written));
        vec![RawEvent::write("/cfg/a.json")]
    })?;

    assert_eq!(controller.get("a"), Some(v2.clone()));
    drain(&fs, &sender, &controller).await;
    assert_eq!(recorder.len(), 1);

    // Later changes still come through.
    let v3 = GameModeBuilder::new("a").players(3, 3).build();
    fs.add_file("/cfg/a.json", game_mode_json(&v3));
    push(&sender, RawEvent::write("/cfg/a.json"));
    wait_until(|| recorder.len() == 2).await;
    assert_eq!(recorder.summary()[1], (UpdateKind::Modified, "a".to_string()));
    assert_eq!(controller.get("a"), Some(v3));
    Ok(())
}

#[tokio::test]
async fn file_removed_before_scan_is_a_silent_noop() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/cfg/a.json", game_mode_json(&mode("a")));

    let recorder = EventRecorder::new();
    let (controller, sender) = open_racing(&fs, &recorder, |fs| {
        fs.remove("/cfg/a.json");
        vec![RawEvent::remove("/cfg/a.json")]
    })?;

    assert!(controller.get("a").is_none());
    drain(&fs, &sender, &controller).await;
    assert_eq!(recorder.len(), 1);
    assert_eq!(controller.keys(), vec!["zz-marker"]);
    Ok(())
}
