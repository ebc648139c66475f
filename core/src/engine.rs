//! The campaign engine. Owns the campaign and runs the clock.
//!
//! EXECUTION ORDER of one `advance` (fixed, documented, never reordered):
//!   1. Accumulate scaled frame time; stop below one game second.
//!   2. Detection intervals: advance the date slice by slice, one
//!      periodic pass per slice (periodic.rs). A time-stop request ends
//!      the loop and discards the rest of the frame's time.
//!   3. Remainder: advance the date and run the final periodic pass.
//!   4. Minute, hour and day catch-up (dispatch.rs).
//!   5. Expire missions whose stage timer lapsed (mission.rs).
//!   6. Loss evaluation (outcome.rs).
//!   7. Base attacks, storage overflow, defence auto-targeting.
//!   8. Month close: nation history backup, budget, time stop.
//!   Steps 7 and 8 are skipped on the tick the campaign is lost.
//!
//! RULES:
//!   - advance() never fails. Hook errors are logged and recorded.
//!   - All randomness flows through the RngBank.
//!   - All state changes are recorded as CampaignEvents.

use crate::{
    clock::ClockPhase,
    command::PlayerCommand,
    config::CampaignConfig,
    date::{is_budget_due, SimDate, SECONDS_PER_HOUR},
    dispatch::{self, CatchUpCounts, GranularityMarkers},
    error::{SimError, SimResult},
    event::{CampaignEvent, EventLogEntry, MessageCategory},
    mission,
    nation::{self, ExpenseLine},
    notify::{self, LogSink, MessageSink},
    outcome::{self, CampaignOutcome},
    periodic::run_periodic,
    rng::{RngBank, SubsystemSlot},
    snapshot::CampaignSnapshot,
    state::CampaignState,
    store::SimStore,
    subsystem::{stop_time, CampaignHooks, TickScope},
    types::RunId,
};

/// What one `advance` call did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub date: SimDate,
    /// Full detection intervals run (non-final periodic passes).
    pub intervals: u64,
    /// Whether the final periodic pass ran.
    pub final_pass: bool,
    pub catch_up: CatchUpCounts,
    /// Missions whose stage timer lapsed this call.
    pub expired: usize,
    pub month_closed: bool,
    pub time_stopped: bool,
    pub outcome: CampaignOutcome,
    pub events: Vec<CampaignEvent>,
}

impl TickReport {
    fn idle(state: &CampaignState) -> Self {
        Self {
            date: state.date(),
            intervals: 0,
            final_pass: false,
            catch_up: CatchUpCounts::default(),
            expired: 0,
            month_closed: false,
            time_stopped: state.clock.is_time_stopped(),
            outcome: state.lost().map(CampaignOutcome::Lost).unwrap_or(CampaignOutcome::Continue),
            events: Vec::new(),
        }
    }

    /// Whether the date moved at all.
    pub fn did_work(&self) -> bool {
        self.intervals > 0 || self.final_pass
    }
}

pub struct CampaignEngine {
    pub run_id: RunId,
    seed: u64,
    state: CampaignState,
    config: CampaignConfig,
    rng_bank: RngBank,
    hooks: Box<dyn CampaignHooks>,
    sink: Box<dyn MessageSink>,
    store: Option<SimStore>,
    phase: ClockPhase,
    shut_down: bool,
}

impl CampaignEngine {
    /// Start a campaign without persistence.
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: CampaignConfig,
        hooks: Box<dyn CampaignHooks>,
    ) -> SimResult<Self> {
        Self::build(run_id, seed, config, hooks, None)
    }

    /// Start a campaign that logs to `store`. The run row must exist.
    pub fn with_store(
        run_id: RunId,
        seed: u64,
        config: CampaignConfig,
        hooks: Box<dyn CampaignHooks>,
        store: SimStore,
    ) -> SimResult<Self> {
        Self::build(run_id, seed, config, hooks, Some(store))
    }

    fn build(
        run_id: RunId,
        seed: u64,
        config: CampaignConfig,
        hooks: Box<dyn CampaignHooks>,
        store: Option<SimStore>,
    ) -> SimResult<Self> {
        config.validate()?;
        let state = CampaignState::from_config(&config);
        let mut engine = Self {
            run_id,
            seed,
            state,
            config,
            rng_bank: RngBank::new(seed),
            hooks,
            sink: Box::new(LogSink),
            store,
            phase: ClockPhase::Idle,
            shut_down: false,
        };

        let mut events = vec![CampaignEvent::RunInitialized {
            run_id: engine.run_id.clone(),
            seed,
            day: engine.state.date().day,
        }];
        {
            let mut scope = TickScope::new(
                &mut *engine.hooks,
                &mut engine.state,
                &engine.config,
                &mut engine.rng_bank,
                &mut events,
            );
            scope.call(SubsystemSlot::Lifecycle, |h, ctx| h.init(ctx));
        }
        log::info!(
            "run={} campaign '{}' started at {} (seed {seed})",
            engine.run_id,
            engine.config.id,
            engine.state.date()
        );
        engine.record(&events);
        Ok(engine)
    }

    /// Replace the notification sink. The default writes to the log.
    pub fn set_sink(&mut self, sink: Box<dyn MessageSink>) {
        self.sink = sink;
    }

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    /// Mutable access for hosts and persistence collaborators. Fields
    /// with invariants are only reachable through their accessors.
    pub fn state_mut(&mut self) -> &mut CampaignState {
        &mut self.state
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_bank(&self) -> &RngBank {
        &self.rng_bank
    }

    pub fn store(&self) -> Option<&SimStore> {
        self.store.as_ref()
    }

    /// Where the engine is inside `advance`. Always `Idle` between calls.
    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// Advance the campaign by one frame of real time.
    pub fn advance(&mut self, frame_seconds: f64) -> TickReport {
        if self.state.is_over() || self.state.clock.is_time_stopped() || self.shut_down {
            return TickReport::idle(&self.state);
        }

        self.phase = ClockPhase::Accumulating;
        if !self.state.clock.accumulate(frame_seconds) {
            self.phase = ClockPhase::Idle;
            return TickReport::idle(&self.state);
        }

        let start = self.state.date();
        let markers = GranularityMarkers::capture(&start);
        let calendar_before = start.to_calendar();
        let mut report = TickReport::idle(&self.state);
        let mut events = Vec::new();

        {
            let mut scope = TickScope::new(
                &mut *self.hooks,
                &mut self.state,
                &self.config,
                &mut self.rng_bank,
                &mut events,
            );

            // ── Detection intervals ───────────────────────────
            self.phase = ClockPhase::DispatchingIntervals;
            let plan = scope.state.clock.plan(&start);
            let mut consumed = 0;
            let mut aborted = false;
            for index in 0..plan.checks {
                let slice = plan.slice(index);
                scope.state.advance_date(slice as f64);
                scope.state.clock.consume(slice);
                consumed += slice;
                report.intervals += 1;
                run_periodic(&mut scope, slice, false);
                if scope.time_stop_requested() {
                    scope.state.clock.discard();
                    aborted = true;
                    break;
                }
            }

            let remainder = if aborted { 0 } else { plan.whole_seconds.saturating_sub(consumed) };
            if remainder > 0 {
                scope.state.advance_date(remainder as f64);
                scope.state.clock.consume(remainder);
                run_periodic(&mut scope, remainder, true);
                report.final_pass = true;
            }

            // ── Granularities ─────────────────────────────────
            self.phase = ClockPhase::DispatchingGranularities;
            report.catch_up = dispatch::catch_up(&mut scope, markers);

            // ── Post tick ─────────────────────────────────────
            self.phase = ClockPhase::PostTick;
            report.expired = mission::expire_due_missions(scope.state, scope.config, scope.events);

            let verdict = evaluate_outcome(scope.state, scope.config, scope.events);
            if !verdict.is_lost() {
                scope.call(SubsystemSlot::BaseAttacks, |h, ctx| h.check_base_attacks(ctx));
                scope.call(SubsystemSlot::Storage, |h, ctx| h.check_storage_overflow(ctx));
                scope.call(SubsystemSlot::BaseDefence, |h, ctx| h.auto_select_defence_targets(ctx));

                let calendar_now = scope.state.date().to_calendar();
                if is_budget_due(&calendar_before, &calendar_now)
                    && scope.state.paid
                    && scope.state.base_count() > 0
                {
                    close_month(&mut scope);
                    report.month_closed = true;
                } else if calendar_now.day > 1 {
                    scope.state.paid = true;
                }
            }
        }

        if report.month_closed {
            self.take_snapshot();
        }

        report.date = self.state.date();
        report.time_stopped = self.state.clock.is_time_stopped();
        report.outcome = self
            .state
            .lost()
            .map(CampaignOutcome::Lost)
            .unwrap_or(CampaignOutcome::Continue);
        self.record(&events);
        report.events = events;
        self.phase = ClockPhase::Idle;

        log::debug!(
            "date={} intervals={} days={} expired={}",
            report.date,
            report.intervals,
            report.catch_up.days,
            report.expired
        );
        report
    }

    /// Apply one player command between frames.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Vec<CampaignEvent>> {
        if self.state.is_over() && command.changes_campaign() {
            let reason = self
                .state
                .lost()
                .map(|r| r.message().to_string())
                .unwrap_or_default();
            return Err(SimError::CampaignOver { reason });
        }

        let day = self.state.date().day;
        let mut events = vec![CampaignEvent::PlayerCommandReceived {
            day,
            command_type: command.type_name().to_string(),
        }];
        let state = &mut self.state;
        let config = &self.config;

        match command {
            PlayerCommand::Pause => stop_time(state, &mut events, "paused by player".into()),
            PlayerCommand::Resume => state.clock.resume(),
            PlayerCommand::SetLapse { lapse } => {
                state.clock.set_lapse(lapse);
                events.push(CampaignEvent::LapseChanged { day, lapse });
            }
            PlayerCommand::Faster => {
                state.clock.faster();
                events.push(CampaignEvent::LapseChanged { day, lapse: state.clock.lapse() });
            }
            PlayerCommand::Slower => {
                state.clock.slower();
                events.push(CampaignEvent::LapseChanged { day, lapse: state.clock.lapse() });
            }
            PlayerCommand::SetScale { scale } => {
                if !scale.is_finite() || scale < 0.0 {
                    return Err(SimError::invalid_config(format!("invalid time scale {scale}")));
                }
                state.clock.set_scale(scale);
                events.push(CampaignEvent::LapseChanged { day, lapse: state.clock.lapse() });
            }
            PlayerCommand::AddCredits { amount } => state.add_credits(amount),
            PlayerCommand::SetBaseCount { count } => state.set_base_count(count),
            PlayerCommand::SpawnMission { category, nation, delay_hours } => {
                if let Some(id) = &nation {
                    if state.nation(id).is_none() {
                        return Err(SimError::UnknownNation { id: id.clone() });
                    }
                }
                let delay = f64::from(delay_hours) * f64::from(SECONDS_PER_HOUR);
                mission::create(state, category, nation, mission::MissionCause::Command, delay, &mut events);
            }
            PlayerCommand::ResolveMission { mission_id, won, results } => {
                mission::resolve(state, config, mission_id, &results, won, &mut events)?;
            }
            PlayerCommand::AbortMission { mission_id, reason } => {
                mission::abort(state, mission_id, &reason, &mut events)?;
            }
            PlayerCommand::MarkUfoCrashed { mission_id } => {
                mission::mark_crashed(state, mission_id)?;
            }
            PlayerCommand::DiscoverAlienBase { mission_id } => {
                mission::discover_base(state, config, mission_id, &mut events)?;
            }
        }

        evaluate_outcome(state, config, &mut events);
        self.record(&events);
        Ok(events)
    }

    /// Full campaign state for saving.
    pub fn snapshot(&self) -> CampaignSnapshot {
        CampaignSnapshot {
            run_id: self.run_id.clone(),
            day: self.state.date().day,
            rng: self.rng_bank.clone(),
            state: self.state.clone(),
        }
    }

    /// Continue from a saved snapshot of the same campaign.
    pub fn restore(&mut self, snapshot: CampaignSnapshot) -> SimResult<()> {
        if snapshot.state.campaign_id != self.config.id {
            return Err(SimError::invalid_config(format!(
                "snapshot belongs to campaign '{}', not '{}'",
                snapshot.state.campaign_id, self.config.id
            )));
        }
        log::info!("run={} restored from day {}", self.run_id, snapshot.day);
        self.rng_bank = snapshot.rng;
        self.state = snapshot.state;
        self.phase = ClockPhase::Idle;
        Ok(())
    }

    /// Let the collaborator release its resources. Further `advance`
    /// calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let mut events = Vec::new();
        {
            let mut scope = TickScope::new(
                &mut *self.hooks,
                &mut self.state,
                &self.config,
                &mut self.rng_bank,
                &mut events,
            );
            scope.call(SubsystemSlot::Lifecycle, |h, ctx| h.shutdown(ctx));
        }
        self.record(&events);
        self.shut_down = true;
        log::info!("run={} shut down at {}", self.run_id, self.state.date());
    }

    /// Deliver messages and append events to the log. Storage failures
    /// are logged; they never fail the tick.
    fn record(&mut self, events: &[CampaignEvent]) {
        notify::deliver(self.sink.as_mut(), events);

        let Some(store) = &self.store else {
            return;
        };
        for event in events {
            let entry = match serde_json::to_string(event) {
                Ok(payload) => EventLogEntry {
                    id: None,
                    run_id: self.run_id.clone(),
                    day: event.day(),
                    source: event_source(event, self.hooks.name()).to_string(),
                    event_type: event.type_name().to_string(),
                    payload,
                },
                Err(e) => {
                    log::error!("run={} cannot serialize {}: {e}", self.run_id, event.type_name());
                    continue;
                }
            };
            if let Err(e) = store.append_event(&entry) {
                log::error!("run={} cannot append {}: {e}", self.run_id, entry.event_type);
            }
        }
    }

    fn take_snapshot(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = self.snapshot();
        let saved = serde_json::to_string(&snapshot)
            .map_err(SimError::from)
            .and_then(|json| store.save_snapshot(&self.run_id, snapshot.day, &json));
        match saved {
            Ok(()) => log::debug!("Snapshot saved at day {}", snapshot.day),
            Err(e) => log::error!("run={} snapshot at day {} failed: {e}", self.run_id, snapshot.day),
        }
    }
}

/// Run the loss check and record a loss the first time it happens.
fn evaluate_outcome(
    state: &mut CampaignState,
    config: &CampaignConfig,
    events: &mut Vec<CampaignEvent>,
) -> CampaignOutcome {
    if let Some(reason) = state.lost() {
        return CampaignOutcome::Lost(reason);
    }
    let verdict = outcome::check(state, config);
    if let CampaignOutcome::Lost(reason) = verdict {
        state.mark_lost(reason);
        let day = state.date().day;
        events.push(CampaignEvent::CampaignLost { day, reason });
        events.push(CampaignEvent::MessagePosted {
            day,
            title: "Game over".into(),
            body: reason.message().into(),
            category: MessageCategory::CampaignLost,
        });
        log::info!("day={day} campaign lost: {reason:?}");
    }
    verdict
}

/// Close the calendar month: back up nation history, settle the budget
/// and pause for the player.
fn close_month<H: CampaignHooks + ?Sized>(scope: &mut TickScope<'_, H>) {
    for n in scope.state.nations.iter_mut() {
        nation::backup_monthly(n);
    }
    let extra: Vec<ExpenseLine> =
        scope.call_with(SubsystemSlot::Budget, |h, ctx| h.monthly_expenses(ctx));
    nation::settle_budget(scope.state, scope.config, extra, scope.events);

    scope.state.paid = false;
    scope.state.stats.months_closed += 1;
    let date = scope.state.date();
    let calendar = date.to_calendar();
    scope.events.push(CampaignEvent::MonthClosed {
        day: date.day,
        year: calendar.year,
        month: calendar.month,
    });
    scope.request_time_stop("monthly report");
    log::info!("day={} month closed, credits={}", date.day, scope.state.credits());
}

/// Who produced an event, for the source column.
fn event_source(event: &CampaignEvent, hooks_name: &'static str) -> &'static str {
    match event {
        CampaignEvent::MissionSpawned { .. }
        | CampaignEvent::MissionStageChanged { .. }
        | CampaignEvent::MissionRemoved { .. }
        | CampaignEvent::MissionResolved { .. } => "missions",
        CampaignEvent::HappinessChanged { .. } | CampaignEvent::BudgetSettled { .. } => "nations",
        CampaignEvent::MessagePosted { .. } => "messages",
        CampaignEvent::HookFailed { .. } => hooks_name,
        _ => "engine",
    }
}
