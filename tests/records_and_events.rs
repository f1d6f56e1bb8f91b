// tests/records_and_events.rs

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use notify::event::{
    AccessKind, CreateKind, DataChange, Flag, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::{Event, EventKind};

use liveconfig::gamemode::{MatchMethod, SelectMethod};
use liveconfig::watch::events::signals_from_notify;
use liveconfig::watch::{fingerprint, RawKind, RawOps, RawSignal};
use liveconfig::{GameModeConfig, JsonParser, Record, RecordParser, TomlParser, UpdateKind};

type TestResult = Result<(), Box<dyn Error>>;

const LOBBY: &str = r#"{
  "id": "lobby",
  "enabled": true,
  "fleetName": "lobby-fleet",
  "priority": 2,
  "friendlyName": "Lobby",
  "activityNoun": "hanging out",
  "minPlayers": 1,
  "maxPlayers": 50,
  "displayNpc": {
    "entityType": "VILLAGER",
    "titles": ["<gold>Lobby"],
    "skin": { "texture": "abc", "signature": "def" }
  },
  "partyRestrictions": { "minSize": 1, "maxSize": 4 },
  "maps": {
    "spawn": { "id": "spawn", "enabled": true, "friendlyName": "Spawn", "priority": 5 },
    "old": { "id": "old", "enabled": false, "friendlyName": "Old", "priority": 0 },
    "beach": { "id": "beach", "enabled": true, "friendlyName": "Beach", "priority": 1 }
  },
  "matchmakerInfo": {
    "matchMethod": "INSTANT",
    "selectMethod": "PLAYER_COUNT",
    "rate": 250000000,
    "backfill": true
  }
}"#;

#[test]
fn game_mode_json_parses_with_camel_case_fields() -> TestResult {
    let mode: GameModeConfig = JsonParser::new().parse(LOBBY.as_bytes())?;
    assert_eq!(mode.key(), "lobby");
    assert_eq!(mode.fleet_name, "lobby-fleet");
    assert_eq!(mode.max_players, 50);

    let npc = mode.display_npc.as_ref().ok_or("npc missing")?;
    assert_eq!(npc.entity_type, "VILLAGER");
    assert!(npc.skin.is_some());

    let mm = mode.matchmaker_info.as_ref().ok_or("matchmaker missing")?;
    assert_eq!(mm.match_method, MatchMethod::Instant);
    assert_eq!(mm.select_method, SelectMethod::PlayerCount);
    assert_eq!(mm.rate(), Duration::from_millis(250));

    let maps: Vec<&str> = mode.enabled_maps().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(maps, vec!["beach", "spawn"]);

    assert!(mode.accepts_party_of(4));
    assert!(!mode.accepts_party_of(5));
    assert!(!mode.accepts_party_of(0));
    Ok(())
}

#[test]
fn minimal_game_mode_uses_defaults() -> TestResult {
    let mode: GameModeConfig = JsonParser::new().parse(br#"{"id": "duels"}"#)?;
    assert!(!mode.enabled);
    assert!(mode.maps.is_empty());
    assert!(mode.matchmaker_info.is_none());
    assert!(mode.accepts_party_of(100));
    Ok(())
}

#[test]
fn null_collections_parse_as_empty() -> TestResult {
    let mode: GameModeConfig = JsonParser::new().parse(
        br#"{
  "id": "arena",
  "maps": null,
  "displayItem": { "material": "IRON_SWORD", "lore": null },
  "displayNpc": { "entityType": "ZOMBIE", "titles": null }
}"#,
    )?;
    assert!(mode.maps.is_empty());
    assert!(mode.enabled_maps().is_empty());

    let item = mode.display_item.as_ref().ok_or("item missing")?;
    assert_eq!(item.material, "IRON_SWORD");
    assert!(item.lore.is_empty());

    let npc = mode.display_npc.as_ref().ok_or("npc missing")?;
    assert!(npc.titles.is_empty());
    assert!(npc.skin.is_none());
    Ok(())
}

#[test]
fn parsers_reject_bad_input() {
    let json = JsonParser::<GameModeConfig>::new();
    assert!(json.parse(b"").is_err());
    assert!(json.parse(br#"{"enabled": true}"#).is_err());

    let toml = TomlParser::<GameModeConfig>::new();
    assert!(toml.parse(&[0xff, 0xfe]).is_err());
    assert!(toml.parse(b"id = ").is_err());
}

#[test]
fn toml_parser_reads_the_same_schema() -> TestResult {
    let mode: GameModeConfig = TomlParser::new().parse(
        br#"
id = "bedwars"
enabled = true
minPlayers = 2
maxPlayers = 16
"#,
    )?;
    assert_eq!(mode.key(), "bedwars");
    assert_eq!(mode.min_players, 2);
    Ok(())
}

#[test]
fn closures_are_parsers() -> TestResult {
    let parser = |bytes: &[u8]| -> anyhow::Result<GameModeConfig> {
        let id = std::str::from_utf8(bytes)?.trim().to_string();
        Ok(serde_json::from_value(serde_json::json!({ "id": id }))?)
    };
    assert_eq!(parser.parse(b" solo \n")?.id, "solo");
    Ok(())
}

#[test]
fn raw_ops_resolve_by_precedence() {
    assert_eq!(RawOps::empty().resolve(), None);
    assert_eq!(RawOps::REMOVE.resolve(), Some(RawKind::Remove));
    assert_eq!((RawOps::CREATE | RawOps::REMOVE).resolve(), Some(RawKind::Create));
    assert_eq!(RawOps::all().resolve(), Some(RawKind::Write));
}

fn event(kind: EventKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
}

fn describe(signals: Vec<RawSignal>) -> Vec<String> {
    signals
        .into_iter()
        .map(|s| match s {
            RawSignal::Event(e) => format!("{:?} {}", e.ops.resolve(), e.path.display()),
            RawSignal::Rescan => "rescan".to_string(),
            RawSignal::Error(err) => format!("error {err}"),
        })
        .collect()
}

#[test]
fn notify_events_map_to_raw_signals() {
    let cases: Vec<(Event, Vec<&str>)> = vec![
        (
            event(EventKind::Create(CreateKind::File), &["/d/a.json"]),
            vec!["Some(Create) /d/a.json"],
        ),
        (
            event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/d/a.json"],
            ),
            vec!["Some(Write) /d/a.json"],
        ),
        (
            event(EventKind::Remove(RemoveKind::File), &["/d/a.json"]),
            vec!["Some(Remove) /d/a.json"],
        ),
        (
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/d/.a.json.tmp", "/d/a.json"],
            ),
            vec!["Some(Remove) /d/.a.json.tmp", "Some(Create) /d/a.json"],
        ),
        (
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::From)),
                &["/d/a.json"],
            ),
            vec!["Some(Remove) /d/a.json"],
        ),
        (
            event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                &["/d/a.json"],
            ),
            vec!["Some(Create) /d/a.json"],
        ),
        (
            event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                &["/d/a.json"],
            ),
            vec![],
        ),
        (
            event(EventKind::Access(AccessKind::Any), &["/d/a.json"]),
            vec![],
        ),
        (event(EventKind::Any, &["/d/a.json"]), vec!["Some(Write) /d/a.json"]),
        (
            Event::new(EventKind::Other).set_flag(Flag::Rescan),
            vec!["rescan"],
        ),
    ];

    for (ev, expected) in cases {
        let label = format!("{:?}", ev.kind);
        assert_eq!(describe(signals_from_notify(ev)), expected, "{label}");
    }
}

#[test]
fn fingerprint_is_blake3_hex() {
    // blake3 hash of "hello world"
    assert_eq!(
        fingerprint(b"hello world"),
        "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
    );
    assert_ne!(fingerprint(b"{\"id\":\"a\"}"), fingerprint(b"{\"id\": \"a\"}"));
}

#[test]
fn update_kind_displays_lowercase() {
    assert_eq!(UpdateKind::Created.to_string(), "created");
    assert_eq!(UpdateKind::Modified.to_string(), "modified");
    assert_eq!(UpdateKind::Deleted.to_string(), "deleted");
}
