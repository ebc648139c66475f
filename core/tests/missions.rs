//! Mission stage machine: timers, handlers and removal.

use geoscape_core::{
    config::CampaignConfig,
    date::SimDate,
    error::SimError,
    event::{CampaignEvent, MessageCategory},
    mission::{self, MissionCategory, MissionCause, MissionResults, MissionStage},
    state::CampaignState,
};

const HOUR: f64 = 3_600.0;

fn setup() -> (CampaignState, CampaignConfig, Vec<CampaignEvent>) {
    let config = CampaignConfig::default_test();
    let state = CampaignState::from_config(&config);
    (state, config, Vec::new())
}

fn spawn(state: &mut CampaignState, category: MissionCategory, events: &mut Vec<CampaignEvent>) -> u32 {
    mission::create(state, category, Some("europe".into()), MissionCause::Command, 0.0, events)
}

fn move_date(state: &mut CampaignState, seconds: f64) {
    let date = state.date().add_seconds(seconds);
    state.set_date(date);
}

#[test]
fn stage_ends_exactly_at_its_final_date() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::Recon, &mut events);

    // A zero start delay is due immediately.
    assert_eq!(mission::expire_due_missions(&mut state, &config, &mut events), 1);
    let m = state.missions.get(id).expect("mission");
    assert_eq!(m.stage, MissionStage::ComeFromOrbit);
    assert!(m.active);
    assert!(!m.on_geoscape);

    let arrival = m.final_date.expect("timed stage");
    assert_eq!(arrival, state.date().add_seconds(6.0 * HOUR));

    move_date(&mut state, 6.0 * HOUR - 1.0);
    assert_eq!(mission::expire_due_missions(&mut state, &config, &mut events), 0);

    move_date(&mut state, 1.0);
    assert_eq!(state.date(), arrival);
    assert_eq!(mission::expire_due_missions(&mut state, &config, &mut events), 1);
    let m = state.missions.get(id).expect("mission");
    assert_eq!(m.stage, MissionStage::ReconAir);
    assert!(m.on_geoscape);
}

#[test]
fn intercept_walks_its_sequence_and_is_removed_at_over() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::Intercept, &mut events);

    let mut seen = vec![state.missions.get(id).expect("mission").stage];
    for _ in 0..3 {
        mission::end_stage(&mut state, &config, id, &mut events);
        seen.push(state.missions.get(id).expect("mission").stage);
    }
    assert_eq!(seen, MissionCategory::Intercept.stages()[..4].to_vec());

    mission::end_stage(&mut state, &config, id, &mut events);
    assert!(state.missions.get(id).is_none());
    assert!(events.iter().any(|e| matches!(
        e,
        CampaignEvent::MissionRemoved { mission_id, reason, .. } if *mission_id == id && reason == "completed"
    )));

    // Ending a removed mission again does nothing.
    let before = events.len();
    mission::end_stage(&mut state, &config, id, &mut events);
    assert_eq!(events.len(), before);
}

#[test]
fn board_removal_keeps_creation_order() {
    let (mut state, _config, mut events) = setup();
    let ids: Vec<u32> = (0..4)
        .map(|_| spawn(&mut state, MissionCategory::Supply, &mut events))
        .collect();

    mission::abort(&mut state, ids[1], "target gone", &mut events).expect("abort");

    let left: Vec<u32> = state.missions.iter().map(|m| m.id).collect();
    assert_eq!(left, vec![ids[0], ids[2], ids[3]]);
    assert!(matches!(
        mission::abort(&mut state, ids[1], "again", &mut events),
        Err(SimError::UnknownMission { .. })
    ));
}

#[test]
fn subversion_costs_the_host_nation_happiness() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::Building, &mut events);
    for _ in 0..3 {
        mission::end_stage(&mut state, &config, id, &mut events);
    }
    assert_eq!(state.missions.get(id).expect("mission").stage, MissionStage::SubvertGov);

    mission::end_stage(&mut state, &config, id, &mut events);

    let europe = state.nation("europe").expect("nation").happiness();
    assert!((europe - 0.45).abs() < 1e-9, "happiness {europe}");
    let m = state.missions.get(id).expect("mission");
    assert_eq!(m.stage, MissionStage::BuildBase);
    assert_eq!(m.final_date, None, "building has no time limit");

    // Building never expires on its own.
    move_date(&mut state, 1_000.0 * HOUR);
    mission::expire_due_missions(&mut state, &config, &mut events);
    assert_eq!(state.missions.get(id).expect("mission").stage, MissionStage::BuildBase);

    assert!(mission::discover_base(&mut state, &config, id, &mut events).expect("discover"));
    let m = state.missions.get(id).expect("mission");
    assert_eq!(m.stage, MissionStage::BaseDiscovered);
    assert!(m.final_date.is_some());
    assert!(!mission::discover_base(&mut state, &config, id, &mut events).expect("second discover"));
}

#[test]
fn undefended_base_attack_destroys_a_base() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::BaseAttack, &mut events);
    for _ in 0..3 {
        mission::end_stage(&mut state, &config, id, &mut events);
    }
    assert_eq!(state.missions.get(id).expect("mission").stage, MissionStage::BaseAttack);
    assert_eq!(state.base_count(), 1);

    mission::end_stage(&mut state, &config, id, &mut events);
    assert_eq!(state.base_count(), 0);
    assert_eq!(state.missions.get(id).expect("mission").stage, MissionStage::ReturnToOrbit);
}

#[test]
fn xvi_stage_starts_the_infection_once() {
    let (mut state, config, mut events) = setup();
    let first = spawn(&mut state, MissionCategory::Xvi, &mut events);
    let second = spawn(&mut state, MissionCategory::Xvi, &mut events);
    for id in [first, second] {
        for _ in 0..4 {
            mission::end_stage(&mut state, &config, id, &mut events);
        }
    }
    assert!(state.xvi_started);
    let notices = events
        .iter()
        .filter(|e| matches!(e, CampaignEvent::MessagePosted { title, .. } if title == "XVI"))
        .count();
    assert_eq!(notices, 1);
}

#[test]
fn crashed_mission_ends_with_its_stage() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::Harvest, &mut events);
    mission::end_stage(&mut state, &config, id, &mut events);

    mission::mark_crashed(&mut state, id).expect("crash");
    mission::end_stage(&mut state, &config, id, &mut events);

    assert!(state.missions.get(id).is_none());
    assert!(events.iter().any(|e| matches!(
        e,
        CampaignEvent::MissionRemoved { reason, .. } if reason == "crashed"
    )));
    assert!(mission::mark_crashed(&mut state, id).is_err());
}

#[test]
fn won_battle_removes_the_mission_and_counts() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::TerrorAttack, &mut events);
    let results = MissionResults {
        aliens_killed: 5,
        civilians_survived: 10,
        ..MissionResults::default()
    };

    let performance =
        mission::resolve(&mut state, &config, id, &results, true, &mut events).expect("resolve");

    assert!((performance - 1.5).abs() < 1e-9, "performance {performance}");
    assert!(state.missions.get(id).is_none());
    assert_eq!(state.stats.missions_won, 1);
    assert_eq!(state.stats.aliens_killed, 5);
    assert!(matches!(
        mission::resolve(&mut state, &config, id, &results, true, &mut events),
        Err(SimError::UnknownMission { .. })
    ));
}

#[test]
fn lost_base_defence_costs_the_base() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::BaseAttack, &mut events);
    for _ in 0..3 {
        mission::end_stage(&mut state, &config, id, &mut events);
    }

    let results = MissionResults { aliens_survived: 6, civilians_survived: 2, ..MissionResults::default() };
    mission::resolve(&mut state, &config, id, &results, false, &mut events).expect("resolve");

    assert_eq!(state.base_count(), 0);
    assert!(state.missions.get(id).is_none());
    assert_eq!(state.stats.missions_lost, 1);
}

#[test]
fn lost_battle_elsewhere_keeps_the_mission() {
    let (mut state, config, mut events) = setup();
    let id = spawn(&mut state, MissionCategory::Recon, &mut events);
    let results = MissionResults { aliens_survived: 3, ..MissionResults::default() };
    mission::resolve(&mut state, &config, id, &results, false, &mut events).expect("resolve");

    assert!(state.missions.get(id).is_some());
    assert_eq!(state.base_count(), 1);
}

#[test]
fn delayed_start_waits_in_not_active() {
    let (mut state, config, mut events) = setup();
    let start = state.date();
    let id = mission::create(
        &mut state,
        MissionCategory::Supply,
        None,
        MissionCause::Scheduled,
        12.0 * HOUR,
        &mut events,
    );
    let m = state.missions.get(id).expect("mission");
    assert_eq!(m.start_date, start.add_seconds(12.0 * HOUR));
    assert!(!m.is_due(&start));

    state.set_date(SimDate::new(start.day, 13.0 * HOUR));
    mission::expire_due_missions(&mut state, &config, &mut events);
    assert!(state.missions.get(id).expect("mission").active);
    assert_eq!(state.stats.missions_spawned, 1);
}

#[test]
fn expiry_counts_only_stages_that_ended() {
    let (mut state, config, mut events) = setup();
    let a = spawn(&mut state, MissionCategory::Recon, &mut events);
    let b = spawn(&mut state, MissionCategory::Supply, &mut events);
    mission::mark_crashed(&mut state, b).expect("crash");
    spawn(&mut state, MissionCategory::Harvest, &mut events);

    assert_eq!(mission::expire_due_missions(&mut state, &config, &mut events), 3);
    assert!(state.missions.get(b).is_none(), "crashed mission removed");
    assert_eq!(state.missions.get(a).expect("a").stage, MissionStage::ComeFromOrbit);

    // Every survivor now waits for its arrival.
    assert_eq!(mission::expire_due_missions(&mut state, &config, &mut events), 0);
}

#[test]
fn terror_mission_posts_a_terror_site_message() {
    let (mut state, config, mut events) = setup();
    let terror = spawn(&mut state, MissionCategory::TerrorAttack, &mut events);
    let supply = spawn(&mut state, MissionCategory::Supply, &mut events);
    for _ in 0..3 {
        mission::end_stage(&mut state, &config, terror, &mut events);
        mission::end_stage(&mut state, &config, supply, &mut events);
    }
    assert_eq!(state.missions.get(terror).expect("terror").stage, MissionStage::TerrorMission);
    assert_eq!(state.missions.get(supply).expect("supply").stage, MissionStage::Supply);

    let sites: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CampaignEvent::MessagePosted { category: MessageCategory::TerrorSite, body, .. } => Some(body.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(sites.len(), 1);
    assert!(sites[0].contains("europe"));
}
