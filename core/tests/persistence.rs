//! SQLite event log, run table and snapshots.

mod common;

use common::engine_with_store;
use geoscape_core::{
    command::PlayerCommand,
    config::CampaignConfig,
    event::{CampaignEvent, EventLogEntry},
    mission::MissionCategory,
    snapshot::CampaignSnapshot,
    store::SimStore,
    subsystem::NoHooks,
};

fn store_with_run(run_id: &str) -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .insert_run(run_id, 77, "test", "0.1.0-test", "2084-03-01T00:00:00Z")
        .expect("insert run");
    store
}

fn entry(run_id: &str, day: u32, event: &CampaignEvent) -> EventLogEntry {
    EventLogEntry {
        id: None,
        run_id: run_id.into(),
        day,
        source: "engine".into(),
        event_type: event.type_name().into(),
        payload: serde_json::to_string(event).expect("payload"),
    }
}

#[test]
fn migrations_are_idempotent() {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("first migration");
    store.migrate().expect("second migration");
}

#[test]
fn run_row_round_trips() {
    let store = store_with_run("run-a");
    let run = store.get_run("run-a").expect("query").expect("run exists");
    assert_eq!(run.seed, 77);
    assert_eq!(run.campaign_id, "test");
    assert!(store.get_run("missing").expect("query").is_none());
}

#[test]
fn events_are_read_back_in_insertion_order() {
    let store = store_with_run("run-b");
    let events = [
        CampaignEvent::DayElapsed { day: 3, average_xvi: 0.0 },
        CampaignEvent::TimeStopped { day: 3, reason: "test".into() },
        CampaignEvent::DayElapsed { day: 4, average_xvi: 1.5 },
    ];
    for event in &events {
        store.append_event(&entry("run-b", event.day(), event)).expect("append");
    }

    let day3 = store.events_for_day("run-b", 3).expect("day 3");
    assert_eq!(day3.len(), 2);
    assert_eq!(day3[0].event_type, "day_elapsed");
    assert_eq!(day3[1].event_type, "time_stopped");
    assert!(day3[0].id < day3[1].id);

    let parsed: CampaignEvent = serde_json::from_str(&day3[1].payload).expect("parse payload");
    assert_eq!(parsed, events[1]);

    assert_eq!(store.events_for_run("run-b").expect("all").len(), 3);
    assert_eq!(store.event_count("run-b", "day_elapsed").expect("count"), 2);
}

#[test]
fn events_need_a_known_run() {
    let store = store_with_run("run-c");
    let event = CampaignEvent::DayElapsed { day: 1, average_xvi: 0.0 };
    assert!(store.append_event(&entry("nobody", 1, &event)).is_err());
}

#[test]
fn latest_snapshot_is_picked_by_day() {
    let store = store_with_run("run-d");
    store.save_snapshot("run-d", 10, "{\"a\":1}").expect("save 10");
    store.save_snapshot("run-d", 40, "{\"a\":2}").expect("save 40");

    assert_eq!(
        store.latest_snapshot_before("run-d", 39).expect("query"),
        Some((10, "{\"a\":1}".to_string()))
    );
    assert_eq!(store.latest_snapshot_before("run-d", 40).expect("query").map(|s| s.0), Some(40));
    assert!(store.latest_snapshot_before("run-d", 5).expect("query").is_none());
}

#[test]
fn engine_logs_every_event_it_reports() {
    let mut engine = engine_with_store("run-e", 5, CampaignConfig::default_test(), Box::new(NoHooks));
    engine
        .apply_command(PlayerCommand::SpawnMission {
            category: MissionCategory::Supply,
            nation: Some("africa".into()),
            delay_hours: 0,
        })
        .expect("spawn");
    assert!(engine
        .apply_command(PlayerCommand::SpawnMission {
            category: MissionCategory::Supply,
            nation: Some("atlantis".into()),
            delay_hours: 0,
        })
        .is_err());
    engine.apply_command(PlayerCommand::SetScale { scale: 86_400.0 }).expect("scale");

    let mut reported = 0;
    for _ in 0..3 {
        reported += engine.advance(1.0).events.len();
    }

    let store = engine.store().expect("store");
    let logged = store.events_for_run("run-e").expect("events");
    assert_eq!(store.event_count("run-e", "run_initialized").expect("count"), 1);
    assert_eq!(store.event_count("run-e", "mission_spawned").expect("count"), 1);
    assert_eq!(store.event_count("run-e", "day_elapsed").expect("count"), 3);
    // Initialisation and the two accepted commands come on top of the frames.
    assert!(logged.len() >= reported + 3);
    assert!(logged
        .iter()
        .filter(|e| e.event_type.starts_with("mission_"))
        .all(|e| e.source == "missions"));
}

#[test]
fn snapshot_json_round_trips() {
    let mut engine = engine_with_store("run-f", 9, CampaignConfig::default_test(), Box::new(NoHooks));
    engine.apply_command(PlayerCommand::SetScale { scale: 7_000.0 }).expect("scale");
    engine.advance(1.3);

    let snapshot = engine.snapshot();
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let back: CampaignSnapshot = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(back, snapshot);
    assert_eq!(back.rng.sequence(), engine.rng_bank().sequence());
}

#[test]
fn shutdown_stops_the_clock() {
    let mut engine = engine_with_store("run-g", 2, CampaignConfig::default_test(), Box::new(NoHooks));
    engine.apply_command(PlayerCommand::SetScale { scale: 3_600.0 }).expect("scale");
    engine.shutdown();
    engine.shutdown();

    assert!(!engine.advance(1.0).did_work());
}
