// tests/watch_recovery.rs

mod common;
use crate::common::{
    fast_retry_settings, init_tracing, mode, wait_until, with_timeout, EventRecorder,
    FakeChangeSource, FakeSourceHandle, GameModeBuilder, Harness, DIR,
};

use std::error::Error;

use liveconfig::fs::mock::MockFileSystem;
use liveconfig::{Controller, ControllerBuilder, GameModeConfig, JsonParser, UpdateKind, WatchHealth};

type TestResult = Result<(), Box<dyn Error>>;

fn open(
    h: &Harness,
    max_attempts: u32,
    recorder: &EventRecorder<GameModeConfig>,
) -> Result<(Controller<GameModeConfig>, FakeSourceHandle), Box<dyn Error>> {
    let (source, handle) = FakeChangeSource::new();
    let controller = ControllerBuilder::new(DIR, JsonParser::new())
        .settings(fast_retry_settings(max_attempts))
        .filesystem(h.fs.clone())
        .global_listener(recorder.listener())
        .open_with_source(source)?;
    Ok((controller, handle))
}

#[tokio::test]
async fn lost_subscription_is_restored_and_missed_changes_reconciled() -> TestResult {
    init_tracing();
    let h = Harness::new(MockFileSystem::new());
    h.put("a.json", &mode("a"));
    h.put("b.json", &mode("b"));
    let recorder = EventRecorder::new();
    let (controller, handle) = open(&h, 5, &recorder)?;
    let mut health = controller.health_updates();

    // Changes nobody is told about.
    h.put("a.json", &GameModeBuilder::new("a").enabled(false).build());
    h.fs.remove("/cfg/b.json");
    h.put("c.json", &mode("c"));

    handle.close();

    with_timeout(health.wait_for(|s| matches!(s, WatchHealth::Degraded { attempt: 1, .. })))
        .await?;
    with_timeout(health.wait_for(WatchHealth::is_running)).await?;

    wait_until(|| recorder.len() == 3).await;
    assert_eq!(
        recorder.summary(),
        vec![
            (UpdateKind::Modified, "a".to_string()),
            (UpdateKind::Created, "c".to_string()),
            (UpdateKind::Deleted, "b".to_string()),
        ]
    );
    assert_eq!(controller.keys(), vec!["a", "c"]);
    assert_eq!(handle.subscribe_calls(), 2);

    // The new subscription is live.
    let d = h.put("d.json", &mode("d"));
    handle.create(&d);
    wait_until(|| controller.get("d").is_some()).await;
    Ok(())
}

#[tokio::test]
async fn backend_error_triggers_resubscribe_after_failures() -> TestResult {
    init_tracing();
    let h = Harness::new(MockFileSystem::new());
    let recorder = EventRecorder::new();
    let (controller, handle) = open(&h, 5, &recorder)?;
    let mut health = controller.health_updates();

    handle.fail_next_subscribes(2);
    handle.error("inotify queue broke");

    with_timeout(health.wait_for(|s| matches!(s, WatchHealth::Degraded { attempt: 3, .. })))
        .await?;
    with_timeout(health.wait_for(WatchHealth::is_running)).await?;

    // Initial subscribe, two failures, one success.
    assert_eq!(handle.subscribe_calls(), 4);
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_stop_updates_but_keep_cache() -> TestResult {
    init_tracing();
    let h = Harness::new(MockFileSystem::new());
    h.put("a.json", &mode("a"));
    let recorder = EventRecorder::new();
    let (controller, handle) = open(&h, 2, &recorder)?;
    let mut health = controller.health_updates();

    handle.fail_next_subscribes(u32::MAX);
    handle.close();

    let state = with_timeout(health.wait_for(WatchHealth::is_stopped))
        .await?
        .clone();
    match state {
        WatchHealth::Stopped { reason } => {
            assert!(reason.contains("change subscription lost"), "{reason}");
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(handle.subscribe_calls(), 3);
    assert_eq!(controller.get("a"), Some(mode("a")));
    assert!(recorder.is_empty());
    Ok(())
}

#[tokio::test]
async fn rescan_signal_reconciles_without_resubscribing() -> TestResult {
    init_tracing();
    let h = Harness::new(MockFileSystem::new());
    let recorder = EventRecorder::new();
    let (controller, handle) = open(&h, 5, &recorder)?;

    h.put("a.json", &mode("a"));
    handle.rescan();

    wait_until(|| controller.get("a").is_some()).await;
    assert_eq!(recorder.summary(), vec![(UpdateKind::Created, "a".to_string())]);
    assert_eq!(handle.subscribe_calls(), 1);
    assert!(controller.health().is_running());
    Ok(())
}

#[tokio::test]
async fn close_stops_the_watch_loop() -> TestResult {
    init_tracing();
    let h = Harness::new(MockFileSystem::new());
    let recorder = EventRecorder::new();
    let (controller, handle) = open(&h, 5, &recorder)?;
    let mut health = controller.health_updates();

    controller.close();
    with_timeout(health.wait_for(WatchHealth::is_stopped)).await?;
    assert_eq!(
        controller.health(),
        WatchHealth::Stopped {
            reason: "closed".to_string()
        }
    );

    // Nothing is applied after close.
    let a = h.put("a.json", &mode("a"));
    assert!(!handle.create(&a));
    assert!(controller.get("a").is_none());
    Ok(())
}
