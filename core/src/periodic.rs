//! Detection-interval pass.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. UFO movement
//!   2. Aircraft movement       (radar overlay redraw on the final pass only)
//!   3. Base defence            (weapons and projectiles)
//!   4. New mission detection   (sees the UFO positions from step 1)
//!   5. Alien interest          (bases and installations)
//!   6. Base stealth            (sees the interest from step 5)
//!   7. UFO event flush
//!   8. Opportunistic mission spawn
//!
//! Detection odds are calibrated per interval, so the clock calls this
//! once per DETECTION_INTERVAL of game time plus once for the remainder.

use crate::{
    rng::SubsystemSlot,
    subsystem::{CampaignHooks, SpawnWindow, TickScope},
    types::GameSeconds,
};

pub fn run_periodic<H: CampaignHooks + ?Sized>(
    scope: &mut TickScope<'_, H>,
    dt: GameSeconds,
    final_pass: bool,
) {
    log::debug!(
        "day={} periodic pass dt={dt}s final={final_pass}",
        scope.state().date().day
    );
    scope.call(SubsystemSlot::UfoMovement, |h, ctx| h.move_ufos(ctx, dt));
    scope.call(SubsystemSlot::AircraftMovement, |h, ctx| h.move_aircraft(ctx, dt, final_pass));
    scope.call(SubsystemSlot::BaseDefence, |h, ctx| h.run_base_defence(ctx, dt));
    scope.call(SubsystemSlot::MissionDetection, |h, ctx| h.detect_new_missions(ctx));
    scope.call(SubsystemSlot::AlienInterest, |h, ctx| h.update_alien_interest(ctx));
    scope.call(SubsystemSlot::BaseStealth, |h, ctx| h.update_base_stealth(ctx));
    scope.call(SubsystemSlot::UfoEvents, |h, ctx| h.flush_ufo_events(ctx));
    scope.call(SubsystemSlot::MissionSpawn, |h, ctx| {
        h.spawn_new_missions(ctx, SpawnWindow::Interval)
    });
}
