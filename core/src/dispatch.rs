//! Minute, hour and day catch-up.
//!
//! Each granularity keeps a marker of the last unit it fired for. After the
//! clock moved the date, every unit crossed since the marker fires once,
//! in order, so a jump of several days still runs every daily effect once
//! per day.
//!
//! DAY ORDER (fixed, never reordered):
//!   base data, installation data, hospital, mission spawn roll,
//!   XVI spread, XVI decay, nation happiness decay, base search by nations,
//!   market, scripted campaign events, nation XVI infection,
//!   then the core's average XVI update.
//! XVI spread precedes the infection aggregate; happiness decay precedes
//! the scripted events that may read it.

use crate::{
    date::SimDate,
    event::CampaignEvent,
    nation,
    rng::SubsystemSlot,
    subsystem::{CampaignHooks, SpawnWindow, TickScope},
};

/// Last minute, hour and day the dispatcher fired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranularityMarkers {
    pub minute: u64,
    pub hour: u64,
    pub day: u32,
}

impl GranularityMarkers {
    pub fn capture(date: &SimDate) -> Self {
        Self {
            minute: date.total_minutes(),
            hour: date.total_hours(),
            day: date.day,
        }
    }
}

/// How many units of each granularity fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchUpCounts {
    pub minutes: u64,
    pub hours: u64,
    pub days: u32,
}

pub fn catch_up<H: CampaignHooks + ?Sized>(
    scope: &mut TickScope<'_, H>,
    mut markers: GranularityMarkers,
) -> CatchUpCounts {
    let now = scope.state().date();
    let mut counts = CatchUpCounts::default();

    while markers.minute < now.total_minutes() {
        markers.minute += 1;
        counts.minutes += 1;
        scope.call(SubsystemSlot::Production, |h, ctx| h.run_production(ctx));
    }

    while markers.hour < now.total_hours() {
        markers.hour += 1;
        counts.hours += 1;
        run_hourly(scope);
    }

    while markers.day < now.day {
        markers.day += 1;
        counts.days += 1;
        run_daily(scope, markers.day);
    }

    counts
}

fn run_hourly<H: CampaignHooks + ?Sized>(scope: &mut TickScope<'_, H>) {
    scope.call(SubsystemSlot::Research, |h, ctx| h.run_research(ctx));
    scope.call(SubsystemSlot::UfoRecovery, |h, ctx| h.process_ufo_recovery(ctx));
    scope.call(SubsystemSlot::Installations, |h, ctx| h.update_installation_delay(ctx));
    scope.call(SubsystemSlot::AircraftRepair, |h, ctx| h.repair_aircraft(ctx));
    scope.call(SubsystemSlot::Transfers, |h, ctx| h.run_transfers(ctx));
    scope.call(SubsystemSlot::AlienInterest, |h, ctx| h.increase_alien_interest(ctx));
}

fn run_daily<H: CampaignHooks + ?Sized>(scope: &mut TickScope<'_, H>, day: u32) {
    scope.call(SubsystemSlot::Bases, |h, ctx| h.refresh_base_data(ctx));
    scope.call(SubsystemSlot::Installations, |h, ctx| h.refresh_installation_data(ctx));
    scope.call(SubsystemSlot::Hospital, |h, ctx| h.run_hospital(ctx));
    scope.call(SubsystemSlot::MissionSpawn, |h, ctx| {
        h.spawn_new_missions(ctx, SpawnWindow::Daily)
    });
    scope.call(SubsystemSlot::Xvi, |h, ctx| h.spread_xvi(ctx));
    scope.call(SubsystemSlot::Xvi, |h, ctx| h.reduce_xvi(ctx));

    nation::daily_decay(scope.state, scope.config, scope.events);

    scope.call(SubsystemSlot::BaseSearch, |h, ctx| h.search_bases_by_nations(ctx));
    scope.call(SubsystemSlot::Market, |h, ctx| h.run_market(ctx));
    scope.call(SubsystemSlot::CampaignEvents, |h, ctx| h.check_campaign_events(ctx));
    scope.call(SubsystemSlot::Xvi, |h, ctx| h.update_nation_xvi_infection(ctx));

    scope.state.recompute_average_xvi();
    let average_xvi = scope.state.average_xvi;
    scope.events.push(CampaignEvent::DayElapsed { day, average_xvi });
    log::debug!("day={day} daily effects done, average xvi {average_xvi:.2}");
}
