//! Alien missions and their stage machine.
//!
//! Every mission walks the stage sequence of its category. A stage with a
//! timer ends when the campaign date reaches its final date; the stage's
//! handler from `STAGE_HANDLERS` runs and the mission moves on. Reaching
//! `Over` removes the mission in the same call.

use crate::{
    config::{CampaignConfig, MissionTimingConfig},
    date::{SimDate, SECONDS_PER_HOUR},
    error::{SimError, SimResult},
    event::{CampaignEvent, MessageCategory},
    nation::{self, HAPPINESS_SUBVERSION_LOSS},
    state::CampaignState,
    types::{MissionId, NationId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionCategory {
    Recon,
    TerrorAttack,
    BaseAttack,
    Building,
    Supply,
    Xvi,
    Intercept,
    Harvest,
}

impl MissionCategory {
    pub const ALL: [MissionCategory; 8] = [
        Self::Recon,
        Self::TerrorAttack,
        Self::BaseAttack,
        Self::Building,
        Self::Supply,
        Self::Xvi,
        Self::Intercept,
        Self::Harvest,
    ];

    /// Ordered stages a mission of this category goes through.
    pub fn stages(&self) -> &'static [MissionStage] {
        use MissionStage::*;
        match self {
            Self::Recon => &[NotActive, ComeFromOrbit, ReconAir, MissionGoto, ReconGround, ReturnToOrbit, Over],
            Self::TerrorAttack => &[NotActive, ComeFromOrbit, MissionGoto, TerrorMission, ReturnToOrbit, Over],
            Self::BaseAttack => &[NotActive, ComeFromOrbit, MissionGoto, BaseAttack, ReturnToOrbit, Over],
            Self::Building => &[NotActive, ComeFromOrbit, MissionGoto, SubvertGov, BuildBase, BaseDiscovered, Over],
            Self::Supply => &[NotActive, ComeFromOrbit, MissionGoto, Supply, ReturnToOrbit, Over],
            Self::Xvi => &[NotActive, ComeFromOrbit, MissionGoto, SpreadXvi, ReturnToOrbit, Over],
            Self::Intercept => &[NotActive, ComeFromOrbit, Intercept, ReturnToOrbit, Over],
            Self::Harvest => &[NotActive, ComeFromOrbit, MissionGoto, Harvest, ReturnToOrbit, Over],
        }
    }

    /// Stage following `stage`, or None when `stage` is not part of this
    /// category's sequence or is its last entry.
    pub fn next_stage(&self, stage: MissionStage) -> Option<MissionStage> {
        let stages = self.stages();
        stages
            .iter()
            .position(|s| *s == stage)
            .and_then(|i| stages.get(i + 1))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Recon        => "recon",
            Self::TerrorAttack => "terror attack",
            Self::BaseAttack   => "base attack",
            Self::Building     => "base building",
            Self::Supply       => "supply",
            Self::Xvi          => "XVI spreading",
            Self::Intercept    => "interception",
            Self::Harvest      => "harvesting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStage {
    NotActive,
    ComeFromOrbit,
    ReconAir,
    MissionGoto,
    ReconGround,
    TerrorMission,
    BuildBase,
    BaseAttack,
    SubvertGov,
    Supply,
    SpreadXvi,
    Intercept,
    BaseDiscovered,
    Harvest,
    ReturnToOrbit,
    Over,
}

impl MissionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Over)
    }

    /// Stages during which the aliens act on the ground and the host
    /// nation loses happiness every day.
    pub fn harms_nation(&self) -> bool {
        matches!(
            self,
            Self::TerrorMission | Self::SubvertGov | Self::ReconGround | Self::SpreadXvi | Self::Harvest
        )
    }

    /// How long the stage runs before its timer lapses. None means the
    /// stage has no time limit.
    pub fn duration_hours(&self, timings: &MissionTimingConfig) -> Option<u32> {
        match self {
            Self::ComeFromOrbit => Some(timings.arrival_hours),
            Self::ReconAir | Self::MissionGoto | Self::ReconGround => Some(timings.recon_hours),
            Self::TerrorMission
            | Self::BaseAttack
            | Self::Supply
            | Self::SpreadXvi
            | Self::Intercept
            | Self::Harvest
            | Self::BaseDiscovered => Some(timings.objective_hours),
            Self::SubvertGov => Some(timings.base_building_hours),
            Self::ReturnToOrbit => Some(timings.return_hours),
            Self::BuildBase | Self::NotActive | Self::Over => None,
        }
    }
}

/// What made the aliens start a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionCause {
    /// Daily spawn roll.
    Scheduled,
    /// Opportunistic spawn during a detection interval.
    Opportunistic,
    /// Alien retaliation after a lost battle.
    Retaliation,
    /// Scripted campaign event.
    Scripted,
    /// Debug or player command.
    Command,
}

/// Battle outcome reported by the tactical layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionResults {
    pub aliens_killed: u32,
    pub aliens_stunned: u32,
    pub aliens_survived: u32,
    pub civilians_survived: u32,
    pub civilians_killed: u32,
    pub civilians_killed_friendly_fire: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub category: MissionCategory,
    pub stage: MissionStage,
    pub start_date: SimDate,
    /// End of the current stage. None for stages without a time limit.
    pub final_date: Option<SimDate>,
    pub active: bool,
    pub on_geoscape: bool,
    /// The UFO of this mission crashed; the mission ends with its stage.
    pub crashed: bool,
    pub nation: Option<NationId>,
    pub cause: MissionCause,
}

impl Mission {
    /// True once `now` has reached the final date. Reaching it exactly
    /// counts as due.
    pub fn is_due(&self, now: &SimDate) -> bool {
        self.final_date
            .map(|end| !end.later_than(now))
            .unwrap_or(false)
    }
}

/// Missions of the running campaign in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionBoard {
    missions: Vec<Mission>,
    next_id: MissionId,
}

impl MissionBoard {
    /// Add a mission and assign it the next free id.
    pub fn insert(&mut self, mut mission: Mission) -> MissionId {
        self.next_id += 1;
        mission.id = self.next_id;
        self.missions.push(mission);
        self.next_id
    }

    pub fn get(&self, id: MissionId) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MissionId) -> Option<&mut Mission> {
        self.missions.iter_mut().find(|m| m.id == id)
    }

    /// Remove a mission, keeping the order of the others.
    pub fn remove(&mut self, id: MissionId) -> Option<Mission> {
        let idx = self.missions.iter().position(|m| m.id == id)?;
        Some(self.missions.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mission> {
        self.missions.iter()
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.missions.iter().filter(|m| m.active).count()
    }

    /// Ids of every mission due at `now`, in board order.
    pub fn due(&self, now: &SimDate) -> Vec<MissionId> {
        self.missions
            .iter()
            .filter(|m| m.is_due(now))
            .map(|m| m.id)
            .collect()
    }
}

// ── Lifecycle ──────────────────────────────────────────────────

/// Spawn a mission. It waits in `NotActive` until `start_delay` game
/// seconds have passed.
pub fn create(
    state: &mut CampaignState,
    category: MissionCategory,
    nation: Option<NationId>,
    cause: MissionCause,
    start_delay: f64,
    events: &mut Vec<CampaignEvent>,
) -> MissionId {
    let now = state.date();
    let start_date = now.add_seconds(start_delay.max(0.0));
    let id = state.missions.insert(Mission {
        id: 0,
        category,
        stage: MissionStage::NotActive,
        start_date,
        final_date: Some(start_date),
        active: false,
        on_geoscape: false,
        crashed: false,
        nation: nation.clone(),
        cause,
    });
    state.stats.missions_spawned += 1;
    events.push(CampaignEvent::MissionSpawned {
        day: now.day,
        mission_id: id,
        category,
        nation,
    });
    log::debug!("day={} mission {id} ({}) spawned, starts {start_date}", now.day, category.label());
    id
}

/// End the current stage of every mission whose timer lapsed.
pub fn expire_due_missions(
    state: &mut CampaignState,
    config: &CampaignConfig,
    events: &mut Vec<CampaignEvent>,
) -> usize {
    let now = state.date();
    let due = state.missions.due(&now);
    let mut count = 0;
    for id in due {
        // An earlier handler may have moved or removed this one.
        let still_due = state.missions.get(id).map(|m| m.is_due(&now)).unwrap_or(false);
        if still_due {
            end_stage(state, config, id, events);
            count += 1;
        }
    }
    count
}

struct StageEnd<'a> {
    state: &'a mut CampaignState,
    config: &'a CampaignConfig,
    events: &'a mut Vec<CampaignEvent>,
}

type StageHandler = fn(&mut StageEnd<'_>, &Mission);

/// Side effects of a stage running out its timer. Stages not listed end
/// without side effects.
const STAGE_HANDLERS: &[(MissionStage, StageHandler)] = &[
    (MissionStage::NotActive, on_mission_start),
    (MissionStage::ComeFromOrbit, on_arrival),
    (MissionStage::MissionGoto, on_target_reached),
    (MissionStage::SubvertGov, on_subversion),
    (MissionStage::BaseAttack, on_base_attack_undefended),
    (MissionStage::SpreadXvi, on_xvi_spread),
    (MissionStage::ReturnToOrbit, on_departure),
];

fn handler_for(stage: MissionStage) -> Option<StageHandler> {
    STAGE_HANDLERS
        .iter()
        .find(|(s, _)| *s == stage)
        .map(|(_, handler)| *handler)
}

fn on_mission_start(ctx: &mut StageEnd<'_>, mission: &Mission) {
    if let Some(m) = ctx.state.missions.get_mut(mission.id) {
        m.active = true;
    }
}

fn on_arrival(ctx: &mut StageEnd<'_>, mission: &Mission) {
    if let Some(m) = ctx.state.missions.get_mut(mission.id) {
        m.on_geoscape = true;
    }
}

fn on_target_reached(ctx: &mut StageEnd<'_>, mission: &Mission) {
    if mission.category != MissionCategory::TerrorAttack {
        return;
    }
    let place = mission.nation.as_deref().unwrap_or("an unknown region");
    ctx.events.push(CampaignEvent::MessagePosted {
        day: ctx.state.date().day,
        title: "Terror site".into(),
        body: format!("Alien terror mission {} has begun in {place}", mission.id),
        category: MessageCategory::TerrorSite,
    });
}

fn on_subversion(ctx: &mut StageEnd<'_>, mission: &Mission) {
    if let Some(nation_id) = &mission.nation {
        nation::adjust_happiness(ctx.state, ctx.config, nation_id, HAPPINESS_SUBVERSION_LOSS, ctx.events);
    }
}

fn on_base_attack_undefended(ctx: &mut StageEnd<'_>, mission: &Mission) {
    ctx.state.destroy_base();
    ctx.events.push(CampaignEvent::MessagePosted {
        day: ctx.state.date().day,
        title: "Base attack".into(),
        body: format!("A base fell to alien mission {}", mission.id),
        category: MessageCategory::BaseAttack,
    });
}

fn on_xvi_spread(ctx: &mut StageEnd<'_>, _mission: &Mission) {
    if !ctx.state.xvi_started {
        ctx.state.xvi_started = true;
        ctx.events.push(CampaignEvent::MessagePosted {
            day: ctx.state.date().day,
            title: "XVI".into(),
            body: "The aliens have started spreading the XVI infection.".into(),
            category: MessageCategory::Standard,
        });
    }
}

fn on_departure(ctx: &mut StageEnd<'_>, mission: &Mission) {
    if mission.on_geoscape {
        ctx.events.push(CampaignEvent::MessagePosted {
            day: ctx.state.date().day,
            title: "Notice".into(),
            body: format!("The UFO of the {} mission has left Earth's airspace", mission.category.label()),
            category: MessageCategory::UfoSpotted,
        });
    }
}

/// End the current stage of mission `id`.
///
/// Unknown ids are ignored, so ending an already removed mission is a
/// no-op. A crashed mission, a terminal stage or a stage outside the
/// category's sequence removes the mission before anything else happens.
pub fn end_stage(
    state: &mut CampaignState,
    config: &CampaignConfig,
    id: MissionId,
    events: &mut Vec<CampaignEvent>,
) {
    let Some(mission) = state.missions.get(id).cloned() else {
        return;
    };
    let day = state.date().day;

    let next = mission.category.next_stage(mission.stage);
    let next = match next {
        Some(next) if !mission.crashed && !mission.stage.is_terminal() => next,
        _ => {
            debug_assert!(
                mission.crashed || mission.stage.is_terminal(),
                "mission {id} in stage {:?} not valid for {:?}",
                mission.stage,
                mission.category
            );
            let reason = if mission.crashed { "crashed" } else { "ended" };
            remove(state, id, reason, events);
            return;
        }
    };

    if next.is_terminal() {
        remove(state, id, "completed", events);
    }

    if let Some(handler) = handler_for(mission.stage) {
        let mut ctx = StageEnd {
            state: &mut *state,
            config,
            events: &mut *events,
        };
        handler(&mut ctx, &mission);
    }

    if next.is_terminal() {
        return;
    }

    let now = state.date();
    if let Some(m) = state.missions.get_mut(id) {
        m.stage = next;
        m.final_date = next
            .duration_hours(&config.missions)
            .map(|h| now.add_seconds(f64::from(h) * f64::from(SECONDS_PER_HOUR)));
    }
    events.push(CampaignEvent::MissionStageChanged {
        day,
        mission_id: id,
        from: mission.stage,
        to: next,
    });
    log::debug!("day={day} mission {id} {:?} -> {next:?}", mission.stage);
}

/// Report a battle fought on mission `id`. Happiness moves for every
/// nation; a won battle ends the mission, a lost base defence costs the
/// base. Returns the battle performance score.
pub fn resolve(
    state: &mut CampaignState,
    config: &CampaignConfig,
    id: MissionId,
    results: &MissionResults,
    won: bool,
    events: &mut Vec<CampaignEvent>,
) -> SimResult<f64> {
    let mission = state
        .missions
        .get(id)
        .cloned()
        .ok_or(SimError::UnknownMission { id })?;
    let day = state.date().day;

    if won {
        state.stats.missions_won += 1;
    } else {
        state.stats.missions_lost += 1;
    }
    state.stats.aliens_killed += results.aliens_killed;
    state.stats.aliens_stunned += results.aliens_stunned;
    state.stats.civilians_killed += results.civilians_killed + results.civilians_killed_friendly_fire;

    let performance =
        nation::handle_mission_result(state, config, mission.nation.as_deref(), results, won, events);
    events.push(CampaignEvent::MissionResolved {
        day,
        mission_id: id,
        won,
        performance,
    });

    if won {
        remove(state, id, "won", events);
    } else if mission.stage == MissionStage::BaseAttack {
        state.destroy_base();
        remove(state, id, "base destroyed", events);
    }
    Ok(performance)
}

/// Drop a mission without running stage handlers, e.g. when its target
/// no longer exists.
pub fn abort(
    state: &mut CampaignState,
    id: MissionId,
    reason: &str,
    events: &mut Vec<CampaignEvent>,
) -> SimResult<()> {
    if state.missions.get(id).is_none() {
        return Err(SimError::UnknownMission { id });
    }
    remove(state, id, reason, events);
    Ok(())
}

/// The player located the alien base built by mission `id`. Its
/// open-ended building stage becomes a timed discovered stage.
pub fn discover_base(
    state: &mut CampaignState,
    config: &CampaignConfig,
    id: MissionId,
    events: &mut Vec<CampaignEvent>,
) -> SimResult<bool> {
    let stage = state
        .missions
        .get(id)
        .map(|m| m.stage)
        .ok_or(SimError::UnknownMission { id })?;
    if stage != MissionStage::BuildBase {
        return Ok(false);
    }
    end_stage(state, config, id, events);
    Ok(true)
}

/// Mark a mission's UFO as crashed. Its current stage then ends the mission.
pub fn mark_crashed(state: &mut CampaignState, id: MissionId) -> SimResult<()> {
    let mission = state
        .missions
        .get_mut(id)
        .ok_or(SimError::UnknownMission { id })?;
    mission.crashed = true;
    Ok(())
}

fn remove(state: &mut CampaignState, id: MissionId, reason: &str, events: &mut Vec<CampaignEvent>) {
    if let Some(mission) = state.missions.remove(id) {
        events.push(CampaignEvent::MissionRemoved {
            day: state.date().day,
            mission_id: id,
            category: mission.category,
            reason: reason.to_string(),
        });
    }
}
