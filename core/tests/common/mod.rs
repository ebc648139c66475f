//! Shared collaborators for the integration tests.
#![allow(dead_code)]

use geoscape_core::{
    config::CampaignConfig,
    engine::CampaignEngine,
    error::{SimError, SimResult},
    event::{CampaignEvent, MessageCategory},
    mission::{MissionCategory, MissionCause, MissionResults},
    notify::MessageSink,
    store::SimStore,
    subsystem::{CampaignHooks, HookContext, SpawnWindow},
    types::GameSeconds,
};
use std::sync::{Arc, Mutex};

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Writes the name of every hook it receives into a shared log.
#[derive(Default)]
pub struct RecordingHooks {
    pub log: CallLog,
    /// Request a time stop on the n-th detection pass (1-based).
    pub stop_on_detection: Option<usize>,
    /// Make `run_market` fail.
    pub fail_market: bool,
    detections: usize,
}

impl RecordingHooks {
    pub fn new() -> (Self, CallLog) {
        let hooks = Self::default();
        let log = hooks.log.clone();
        (hooks, log)
    }

    fn push(&self, name: impl Into<String>) {
        self.log.lock().expect("call log").push(name.into());
    }
}

pub fn count(log: &CallLog, name: &str) -> usize {
    log.lock().expect("call log").iter().filter(|c| c.as_str() == name).count()
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log").clone()
}

pub fn clear(log: &CallLog) {
    log.lock().expect("call log").clear();
}

impl CampaignHooks for RecordingHooks {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn init(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("init");
        Ok(())
    }
    fn shutdown(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("shutdown");
        Ok(())
    }

    fn move_ufos(&mut self, _ctx: &mut HookContext<'_>, dt: GameSeconds) -> SimResult<()> {
        self.push(format!("move_ufos:{dt}"));
        Ok(())
    }
    fn move_aircraft(&mut self, _ctx: &mut HookContext<'_>, _dt: GameSeconds, overlay: bool) -> SimResult<()> {
        self.push(format!("move_aircraft:{overlay}"));
        Ok(())
    }
    fn run_base_defence(&mut self, _ctx: &mut HookContext<'_>, _dt: GameSeconds) -> SimResult<()> {
        self.push("run_base_defence");
        Ok(())
    }
    fn detect_new_missions(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("detect_new_missions");
        self.detections += 1;
        if self.stop_on_detection == Some(self.detections) {
            ctx.request_time_stop("test stop");
        }
        Ok(())
    }
    fn update_alien_interest(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("update_alien_interest");
        Ok(())
    }
    fn update_base_stealth(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("update_base_stealth");
        Ok(())
    }
    fn flush_ufo_events(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("flush_ufo_events");
        Ok(())
    }
    fn spawn_new_missions(&mut self, _ctx: &mut HookContext<'_>, window: SpawnWindow) -> SimResult<()> {
        self.push(format!("spawn_new_missions:{window:?}"));
        Ok(())
    }

    fn run_production(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("run_production");
        Ok(())
    }

    fn run_research(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("run_research");
        Ok(())
    }
    fn process_ufo_recovery(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("process_ufo_recovery");
        Ok(())
    }
    fn update_installation_delay(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("update_installation_delay");
        Ok(())
    }
    fn repair_aircraft(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("repair_aircraft");
        Ok(())
    }
    fn run_transfers(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("run_transfers");
        Ok(())
    }
    fn increase_alien_interest(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("increase_alien_interest");
        Ok(())
    }

    fn refresh_base_data(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("refresh_base_data");
        Ok(())
    }
    fn refresh_installation_data(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("refresh_installation_data");
        Ok(())
    }
    fn run_hospital(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("run_hospital");
        Ok(())
    }
    fn spread_xvi(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("spread_xvi");
        Ok(())
    }
    fn reduce_xvi(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("reduce_xvi");
        Ok(())
    }
    fn search_bases_by_nations(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("search_bases_by_nations");
        Ok(())
    }
    fn run_market(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("run_market");
        if self.fail_market {
            return Err(SimError::invalid_config("market closed"));
        }
        Ok(())
    }
    fn check_campaign_events(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("check_campaign_events");
        Ok(())
    }
    fn update_nation_xvi_infection(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("update_nation_xvi_infection");
        Ok(())
    }

    fn check_base_attacks(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("check_base_attacks");
        Ok(())
    }
    fn check_storage_overflow(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("check_storage_overflow");
        Ok(())
    }
    fn auto_select_defence_targets(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.push("auto_select_defence_targets");
        Ok(())
    }
}

/// A collaborator whose every decision comes from its RNG stream and the
/// campaign state, so two runs with the same seed must agree.
#[derive(Default)]
pub struct RandomHooks;

impl CampaignHooks for RandomHooks {
    fn name(&self) -> &'static str {
        "random"
    }

    fn spawn_new_missions(&mut self, ctx: &mut HookContext<'_>, window: SpawnWindow) -> SimResult<()> {
        if window != SpawnWindow::Daily || !ctx.rng.chance(0.5) {
            return Ok(());
        }
        let nations: Vec<String> = ctx.state.nations.iter().map(|n| n.id.clone()).collect();
        let nation = ctx.rng.pick(&nations).cloned();
        let category = *ctx.rng.pick(&MissionCategory::ALL).expect("categories");
        let delay = ctx.rng.next_f64() * 86_400.0;
        ctx.spawn_mission(category, nation, MissionCause::Scheduled, delay);
        Ok(())
    }

    fn run_market(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        let sold = ctx.rng.next_u64_below(1_000) as i64;
        ctx.state.add_credits(sold);
        Ok(())
    }

    fn auto_select_defence_targets(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        let target = ctx
            .state
            .missions
            .iter()
            .find(|m| m.stage.harms_nation())
            .map(|m| m.id);
        let Some(id) = target else {
            return Ok(());
        };
        if !ctx.rng.chance(0.3) {
            return Ok(());
        }
        let killed = ctx.rng.next_u64_below(6) as u32;
        let results = MissionResults {
            aliens_killed: killed,
            aliens_survived: 1,
            civilians_survived: 4,
            civilians_killed: ctx.rng.next_u64_below(3) as u32,
            ..MissionResults::default()
        };
        let won = ctx.rng.chance(0.6);
        ctx.resolve_mission(id, &results, won)?;
        Ok(())
    }
}

pub type MessageLog = Arc<Mutex<Vec<(String, MessageCategory)>>>;

/// Keeps every delivered message.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: MessageLog,
}

impl MessageSink for RecordingSink {
    fn post_message(&mut self, title: &str, _body: &str, category: MessageCategory) {
        self.messages
            .lock()
            .expect("message log")
            .push((title.to_string(), category));
    }
}

/// Route library logs through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine over the test campaign running at `scale` game seconds per
/// real second.
pub fn engine_with_scale(hooks: Box<dyn CampaignHooks>, scale: f64) -> CampaignEngine {
    init_logging();
    let mut engine = CampaignEngine::new("test-run".into(), 42, CampaignConfig::default_test(), hooks)
        .expect("build engine");
    engine
        .apply_command(geoscape_core::command::PlayerCommand::SetScale { scale })
        .expect("set scale");
    engine
}

/// Engine that logs to a fresh in-memory store.
pub fn engine_with_store(
    run_id: &str,
    seed: u64,
    config: CampaignConfig,
    hooks: Box<dyn CampaignHooks>,
) -> CampaignEngine {
    init_logging();
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .insert_run(run_id, seed, &config.id, "0.1.0-test", "2084-03-01T00:00:00Z")
        .expect("insert run");
    CampaignEngine::with_store(run_id.to_string(), seed, config, hooks, store).expect("build engine")
}

pub fn has_event(events: &[CampaignEvent], type_name: &str) -> bool {
    events.iter().any(|e| e.type_name() == type_name)
}
