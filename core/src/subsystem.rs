//! Collaborator seam.
//!
//! RULE: Everything the core does not own (UFOs, aircraft, research,
//! production, markets, XVI, ...) lives behind CampaignHooks.
//! The engine calls the hooks in the fixed order documented in engine.rs.
//! A hook sees the campaign only through its HookContext.

use crate::{
    config::CampaignConfig,
    date::SimDate,
    error::SimResult,
    event::{CampaignEvent, MessageCategory},
    mission::{self, MissionCategory, MissionCause, MissionResults},
    nation::ExpenseLine,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    state::CampaignState,
    types::{GameSeconds, MissionId, NationId},
};

/// Which pass asked for new missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnWindow {
    /// Once per detection interval, for immediate spawns.
    Interval,
    /// Once per campaign day, for the regular spawn roll.
    Daily,
}

/// What a hook may touch while it runs.
pub struct HookContext<'a> {
    pub state: &'a mut CampaignState,
    pub config: &'a CampaignConfig,
    /// This invocation's deterministic RNG.
    pub rng: &'a mut SubsystemRng,
    events: &'a mut Vec<CampaignEvent>,
}

impl<'a> HookContext<'a> {
    pub fn new(
        state: &'a mut CampaignState,
        config: &'a CampaignConfig,
        rng: &'a mut SubsystemRng,
        events: &'a mut Vec<CampaignEvent>,
    ) -> Self {
        Self { state, config, rng, events }
    }

    pub fn now(&self) -> SimDate {
        self.state.date()
    }

    pub fn day(&self) -> u32 {
        self.state.date().day
    }

    pub fn emit(&mut self, event: CampaignEvent) {
        self.events.push(event);
    }

    pub fn post_message(&mut self, title: impl Into<String>, body: impl Into<String>, category: MessageCategory) {
        let day = self.day();
        self.events.push(CampaignEvent::MessagePosted {
            day,
            title: title.into(),
            body: body.into(),
            category,
        });
    }

    /// Pause the campaign for the player. The current detection interval
    /// finishes; no further interval runs until the clock is resumed.
    pub fn request_time_stop(&mut self, reason: impl Into<String>) {
        stop_time(self.state, self.events, reason.into());
    }

    pub fn spawn_mission(
        &mut self,
        category: MissionCategory,
        nation: Option<NationId>,
        cause: MissionCause,
        start_delay: f64,
    ) -> MissionId {
        mission::create(self.state, category, nation, cause, start_delay, self.events)
    }

    /// Report a battle the collaborator fought (e.g. an automatic
    /// interception). Same rules as a player-resolved mission.
    pub fn resolve_mission(&mut self, id: MissionId, results: &MissionResults, won: bool) -> SimResult<f64> {
        mission::resolve(self.state, self.config, id, results, won, self.events)
    }
}

/// The contract every campaign collaborator fulfils. Every method
/// defaults to doing nothing, so a collaborator implements only what it
/// owns.
#[allow(unused_variables)]
pub trait CampaignHooks: Send {
    /// Unique stable name for this collaborator.
    fn name(&self) -> &'static str {
        "campaign_hooks"
    }

    // ── Lifecycle ──────────────────────────────────
    fn init(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn shutdown(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }

    // ── Detection interval ─────────────────────────
    fn move_ufos(&mut self, ctx: &mut HookContext<'_>, dt: GameSeconds) -> SimResult<()> {
        Ok(())
    }
    /// `update_radar_overlay` is true on the final pass of a frame only.
    fn move_aircraft(&mut self, ctx: &mut HookContext<'_>, dt: GameSeconds, update_radar_overlay: bool) -> SimResult<()> {
        Ok(())
    }
    fn run_base_defence(&mut self, ctx: &mut HookContext<'_>, dt: GameSeconds) -> SimResult<()> {
        Ok(())
    }
    /// Sees UFO positions already advanced for this interval.
    fn detect_new_missions(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn update_alien_interest(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    /// Sees the alien interest updated this interval.
    fn update_base_stealth(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn flush_ufo_events(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn spawn_new_missions(&mut self, ctx: &mut HookContext<'_>, window: SpawnWindow) -> SimResult<()> {
        Ok(())
    }

    // ── Minute ─────────────────────────────────────
    fn run_production(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }

    // ── Hour ───────────────────────────────────────
    fn run_research(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn process_ufo_recovery(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn update_installation_delay(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn repair_aircraft(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn run_transfers(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn increase_alien_interest(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }

    // ── Day ────────────────────────────────────────
    fn refresh_base_data(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn refresh_installation_data(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn run_hospital(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn spread_xvi(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn reduce_xvi(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn search_bases_by_nations(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn run_market(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    /// May read the happiness decayed earlier the same day.
    fn check_campaign_events(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    /// Runs after XVI spread; report levels with
    /// `CampaignState::set_nation_xvi_infection`.
    fn update_nation_xvi_infection(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }

    // ── End of advance ─────────────────────────────
    fn check_base_attacks(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn check_storage_overflow(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn auto_select_defence_targets(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        Ok(())
    }

    // ── Month ──────────────────────────────────────
    /// Costs the core does not know about (salaries, aircraft, ...).
    fn monthly_expenses(&mut self, ctx: &mut HookContext<'_>) -> SimResult<Vec<ExpenseLine>> {
        Ok(Vec::new())
    }
}

/// Collaborator that owns nothing. Runs the bare clock.
#[derive(Debug, Default)]
pub struct NoHooks;

impl CampaignHooks for NoHooks {
    fn name(&self) -> &'static str {
        "none"
    }
}

/// Everything one `advance` call works on, borrowed from the engine.
pub struct TickScope<'a, H: CampaignHooks + ?Sized> {
    pub(crate) hooks: &'a mut H,
    pub(crate) state: &'a mut CampaignState,
    pub(crate) config: &'a CampaignConfig,
    pub(crate) rng_bank: &'a mut RngBank,
    pub(crate) events: &'a mut Vec<CampaignEvent>,
}

impl<'a, H: CampaignHooks + ?Sized> TickScope<'a, H> {
    pub fn new(
        hooks: &'a mut H,
        state: &'a mut CampaignState,
        config: &'a CampaignConfig,
        rng_bank: &'a mut RngBank,
        events: &'a mut Vec<CampaignEvent>,
    ) -> Self {
        Self { hooks, state, config, rng_bank, events }
    }

    pub fn state(&self) -> &CampaignState {
        self.state
    }

    /// Invoke one hook with a fresh RNG stream for `slot`.
    /// A failing hook is logged and recorded; the tick carries on.
    pub fn call<F>(&mut self, slot: SubsystemSlot, f: F)
    where
        F: FnOnce(&mut H, &mut HookContext<'_>) -> SimResult<()>,
    {
        let mut rng = self.rng_bank.next_stream(slot);
        let result = {
            let mut ctx = HookContext::new(&mut *self.state, self.config, &mut rng, &mut *self.events);
            f(&mut *self.hooks, &mut ctx)
        };
        if let Err(e) = result {
            let day = self.state.date().day;
            log::error!("day={day} hook {} ({}) failed: {e}", slot.name(), self.hooks.name());
            self.events.push(CampaignEvent::HookFailed {
                day,
                slot,
                error: e.to_string(),
            });
        }
    }

    /// Like [`TickScope::call`] for hooks that hand back a value.
    /// Falls back to `T::default()` when the hook fails.
    pub fn call_with<T, F>(&mut self, slot: SubsystemSlot, f: F) -> T
    where
        T: Default,
        F: FnOnce(&mut H, &mut HookContext<'_>) -> SimResult<T>,
    {
        let mut value = T::default();
        self.call(slot, |hooks, ctx| {
            value = f(hooks, ctx)?;
            Ok(())
        });
        value
    }

    pub fn time_stop_requested(&self) -> bool {
        self.state.clock.is_time_stopped()
    }

    pub fn request_time_stop(&mut self, reason: impl Into<String>) {
        stop_time(self.state, self.events, reason.into());
    }
}

/// Raise the time-stop flag once and report it.
pub(crate) fn stop_time(state: &mut CampaignState, events: &mut Vec<CampaignEvent>, reason: String) {
    if state.clock.is_time_stopped() {
        return;
    }
    state.clock.request_time_stop();
    let day = state.date().day;
    log::debug!("day={day} time stop requested: {reason}");
    events.push(CampaignEvent::TimeStopped { day, reason });
}
