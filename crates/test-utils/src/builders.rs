#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use liveconfig::gamemode::{ConfigMap, GameModeConfig, PartyRestrictions};

/// Builder for `GameModeConfig` to simplify test setup.
pub struct GameModeBuilder {
    mode: GameModeConfig,
}

impl GameModeBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            mode: GameModeConfig {
                id: id.to_string(),
                enabled: true,
                fleet_name: id.to_string(),
                priority: 0,
                friendly_name: id.to_string(),
                activity_noun: "playing".to_string(),
                min_players: 1,
                max_players: 8,
                display_item: None,
                display_npc: None,
                party_restrictions: None,
                maps: BTreeMap::new(),
                matchmaker_info: None,
            },
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.mode.enabled = enabled;
        self
    }

    pub fn friendly_name(mut self, name: &str) -> Self {
        self.mode.friendly_name = name.to_string();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.mode.priority = priority;
        self
    }

    pub fn players(mut self, min: u32, max: u32) -> Self {
        self.mode.min_players = min;
        self.mode.max_players = max;
        self
    }

    pub fn party(mut self, min_size: u32, max_size: Option<u32>) -> Self {
        self.mode.party_restrictions = Some(PartyRestrictions { min_size, max_size });
        self
    }

    pub fn map(mut self, id: &str, enabled: bool, priority: i32) -> Self {
        self.mode.maps.insert(
            id.to_string(),
            ConfigMap {
                id: id.to_string(),
                enabled,
                friendly_name: id.to_string(),
                priority,
                display_item: None,
            },
        );
        self
    }

    pub fn build(self) -> GameModeConfig {
        self.mode
    }
}

/// Serialized form of a game mode as it would sit on disk.
pub fn game_mode_json(mode: &GameModeConfig) -> Vec<u8> {
    serde_json::to_vec_pretty(mode).expect("game mode serializes")
}

/// Write `mode` as JSON to `dir/file_name` and return the path.
pub fn write_game_mode(dir: &Path, file_name: &str, mode: &GameModeConfig) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, game_mode_json(mode)).expect("write game mode file");
    path
}

/// Replace `dir/file_name` in one step (write a temp file, then rename), so
/// a watcher never sees a half-written file.
pub fn replace_game_mode(dir: &Path, file_name: &str, mode: &GameModeConfig) -> PathBuf {
    let path = dir.join(file_name);
    let tmp = dir.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, game_mode_json(mode)).expect("write temp game mode file");
    fs::rename(&tmp, &path).expect("rename temp game mode file");
    path
}
