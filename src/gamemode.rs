// src/gamemode.rs

//! Game-mode configuration records.
//!
//! One JSON file per game mode, e.g. `config/gamemodes/lobby.json`:
//!
//! ```json
//! {
//!   "id": "lobby",
//!   "enabled": true,
//!   "fleetName": "lobby",
//!   "priority": 0,
//!   "friendlyName": "Lobby",
//!   "activityNoun": "hanging out",
//!   "minPlayers": 1,
//!   "maxPlayers": 50,
//!   "matchmakerInfo": { "matchMethod": "INSTANT", "selectMethod": "AVAILABLE", "rate": 0, "backfill": true }
//! }
//! ```
//!
//! Only `id` is required. Everything else defaults, and the nested display
//! sections are optional.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::record::Record;

/// Default directory game modes are read from.
pub const DEFAULT_GAMEMODE_DIR: &str = "./config/gamemodes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameModeConfig {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub fleet_name: String,

    /// Ordering for NPC and item display. Lower is shown first.
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub activity_noun: String,

    #[serde(default)]
    pub min_players: u32,
    #[serde(default)]
    pub max_players: u32,

    #[serde(default)]
    pub display_item: Option<ConfigItem>,
    #[serde(default)]
    pub display_npc: Option<ConfigNpc>,

    #[serde(default)]
    pub party_restrictions: Option<PartyRestrictions>,

    /// Maps keyed by map id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub maps: BTreeMap<String, ConfigMap>,

    #[serde(default)]
    pub matchmaker_info: Option<MatchmakerInfo>,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Record for GameModeConfig {
    fn key(&self) -> &str {
        &self.id
    }
}

impl GameModeConfig {
    /// Whether a party of `size` players may queue for this mode.
    pub fn accepts_party_of(&self, size: u32) -> bool {
        match &self.party_restrictions {
            Some(r) => size >= r.min_size && r.max_size.is_none_or(|max| size <= max),
            None => true,
        }
    }

    /// Enabled maps, highest priority (lowest number) first.
    pub fn enabled_maps(&self) -> Vec<&ConfigMap> {
        let mut maps: Vec<&ConfigMap> = self.maps.values().filter(|m| m.enabled).collect();
        maps.sort_by_key(|m| m.priority);
        maps
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItem {
    pub material: String,
    #[serde(default)]
    pub slot: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lore: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNpc {
    pub entity_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub titles: Vec<String>,
    #[serde(default)]
    pub skin: Option<ConfigSkin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSkin {
    pub texture: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRestrictions {
    #[serde(default)]
    pub min_size: u32,
    /// `None` means no upper bound.
    #[serde(default)]
    pub max_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub display_item: Option<ConfigItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    Instant,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectMethod {
    PlayerCount,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchmakerInfo {
    pub match_method: MatchMethod,
    pub select_method: SelectMethod,
    /// Matchmaking tick in nanoseconds.
    #[serde(default)]
    pub rate: u64,
    #[serde(default)]
    pub backfill: bool,
}

impl MatchmakerInfo {
    pub fn rate(&self) -> Duration {
        Duration::from_nanos(self.rate)
    }
}
