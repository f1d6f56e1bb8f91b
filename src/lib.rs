// src/lib.rs

pub mod cli;
pub mod config;
pub mod controller;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod gamemode;
pub mod logging;
pub mod record;
pub mod store;
pub mod types;
pub mod watch;

pub use controller::{open, Controller, ControllerBuilder};
pub use errors::{ErrorSink, LiveConfigError, LogErrorSink, Result};
pub use gamemode::GameModeConfig;
pub use record::{JsonParser, Record, RecordParser, TomlParser};
pub use types::{UpdateEvent, UpdateKind, WatchHealth};

use std::path::Path;

use anyhow::bail;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{default_settings_path, load_and_validate, SettingsFile};
use crate::fs::RealFileSystem;
use crate::watch::{load_all, ConfigFileFilter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading (`--config`, `--dir`)
/// - a one-shot check (`--once`) or a live game mode controller
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(dir) = args.dir {
        settings = settings.with_directory(dir);
    }

    if args.once {
        return check_directory(&settings);
    }

    let controller = ControllerBuilder::<GameModeConfig>::from_settings(
        settings,
        JsonParser::new(),
    )
    .global_listener(|event: &UpdateEvent<GameModeConfig>| {
        info!(
            kind = %event.kind,
            id = %event.record.id,
            enabled = event.record.enabled,
            path = ?event.path,
            "game mode updated"
        );
    })
    .open()?;

    info!(
        dir = ?controller.directory(),
        game_modes = ?controller.keys(),
        "watching for changes; press Ctrl-C to stop"
    );

    let mut health = controller.health_updates();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutting down");
        }
        res = health.wait_for(WatchHealth::is_stopped) => {
            if let Ok(state) = res {
                if let WatchHealth::Stopped { reason } = &*state {
                    bail!("watching stopped: {reason}");
                }
            }
        }
    }

    controller.close();
    Ok(())
}

/// Explicit path must exist; the default path is optional.
fn load_settings(path: Option<&Path>) -> anyhow::Result<SettingsFile> {
    match path {
        Some(path) => Ok(load_and_validate(path)?),
        None => {
            let default = default_settings_path();
            if default.is_file() {
                Ok(load_and_validate(&default)?)
            } else {
                Ok(SettingsFile::default())
            }
        }
    }
}

/// `--once`: load every game mode, print a summary, fail if any file is bad.
fn check_directory(settings: &SettingsFile) -> anyhow::Result<()> {
    let filter = ConfigFileFilter::from_settings(settings.watch())?;
    let parser = JsonParser::<GameModeConfig>::new();
    let dir = &settings.watch().directory;
    let report = load_all::<GameModeConfig>(&RealFileSystem, dir, &filter, &parser)?;

    println!("liveconfig check: {}", dir.display());
    let mut modes: Vec<&GameModeConfig> = report.records.values().collect();
    modes.sort_by(|a, b| a.id.cmp(&b.id));

    println!("game modes ({}):", modes.len());
    for mode in modes {
        let state = if mode.enabled { "enabled" } else { "disabled" };
        println!("  - {} ({state})", mode.id);
        println!("      name: {}", mode.friendly_name);
        println!("      players: {}-{}", mode.min_players, mode.max_players);
        if !mode.maps.is_empty() {
            println!("      maps: {}", mode.enabled_maps().len());
        }
    }

    if report.errors.is_empty() {
        return Ok(());
    }

    println!();
    println!("errors ({}):", report.errors.len());
    for err in &report.errors {
        println!("  - {err}");
    }
    bail!("{} config file(s) failed to load", report.errors.len())
}
