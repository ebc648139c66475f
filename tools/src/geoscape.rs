//! Demo geoscape: a small stand-in for the UFO, radar, XVI and economy
//! systems so the runner has something to schedule.

use geoscape_core::{
    error::SimResult,
    event::MessageCategory,
    mission::{MissionCategory, MissionCause, MissionResults, MissionStage},
    nation::ExpenseLine,
    notify::MessageSink,
    subsystem::{CampaignHooks, HookContext, SpawnWindow},
    types::{MissionId, NationId},
};
use std::collections::{BTreeMap, BTreeSet};

/// Days between two spawn cycles.
const DAYS_BETWEEN_SPAWN_CYCLES: u32 = 3;
/// Chance per interval that radar picks up a UFO on the geoscape.
const DETECTION_CHANCE: f64 = 0.35;
const MAX_XVI: u32 = 100;

#[derive(Debug, Default)]
pub struct DemoGeoscape {
    /// Overall alien interest; grows every hour.
    interest: f64,
    days_since_spawn: u32,
    detected: BTreeSet<MissionId>,
    xvi: BTreeMap<NationId, u32>,
    production_minutes: u64,
    research_hours: u64,
    interceptions: u32,
}

impl DemoGeoscape {
    pub fn new() -> Self {
        Self {
            interest: 20.0,
            ..Self::default()
        }
    }

    fn pick_category(&self, roll: f64) -> MissionCategory {
        // Later in the campaign the aggressive categories take over.
        let late = (self.interest / 200.0).min(1.0);
        let weights = [
            (MissionCategory::Recon, 4.0 - 3.0 * late),
            (MissionCategory::TerrorAttack, 1.0 + 2.0 * late),
            (MissionCategory::BaseAttack, 0.5 + late),
            (MissionCategory::Building, 0.5 + late),
            (MissionCategory::Supply, 1.0),
            (MissionCategory::Xvi, 2.0 * late),
            (MissionCategory::Intercept, 1.0),
            (MissionCategory::Harvest, 1.0 + late),
        ];
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut target = roll * total;
        for (category, weight) in weights {
            if target < weight {
                return category;
            }
            target -= weight;
        }
        MissionCategory::Recon
    }
}

impl CampaignHooks for DemoGeoscape {
    fn name(&self) -> &'static str {
        "demo_geoscape"
    }

    fn init(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        for nation in &ctx.state.nations {
            self.xvi.insert(nation.id.clone(), 0);
        }
        ctx.post_message("Welcome", format!("Campaign '{}' begins.", ctx.config.name), MessageCategory::Standard);
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        log::info!(
            "demo geoscape: {} production minutes, {} research hours, {} interceptions",
            self.production_minutes,
            self.research_hours,
            self.interceptions
        );
        self.detected.clear();
        ctx.post_message("Farewell", "Campaign closed.", MessageCategory::Info);
        Ok(())
    }

    fn detect_new_missions(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        let candidates: Vec<(MissionId, MissionCategory)> = ctx
            .state
            .missions
            .iter()
            .filter(|m| m.on_geoscape && !self.detected.contains(&m.id))
            .map(|m| (m.id, m.category))
            .collect();

        for (id, category) in candidates {
            if ctx.rng.chance(DETECTION_CHANCE) {
                self.detected.insert(id);
                ctx.post_message(
                    "UFO spotted",
                    format!("Radar detected a UFO on a {} mission", category.label()),
                    MessageCategory::UfoSpotted,
                );
                ctx.request_time_stop("new UFO detected");
            }
        }
        Ok(())
    }

    fn spawn_new_missions(&mut self, ctx: &mut HookContext<'_>, window: SpawnWindow) -> SimResult<()> {
        if window == SpawnWindow::Interval {
            return Ok(());
        }
        self.days_since_spawn += 1;
        if self.days_since_spawn < DAYS_BETWEEN_SPAWN_CYCLES {
            return Ok(());
        }
        self.days_since_spawn = 0;

        let nations: Vec<NationId> = ctx.state.nations.iter().map(|n| n.id.clone()).collect();
        let count = 1 + (self.interest / 100.0) as u64 + ctx.rng.next_u64_below(2);
        for _ in 0..count {
            let Some(nation) = ctx.rng.pick(&nations).cloned() else {
                log::warn!("day={} no nation to spawn a mission in, skipping", ctx.day());
                continue;
            };
            let category = self.pick_category(ctx.rng.next_f64());
            let delay = ctx.rng.next_f64() * 3.0 * 86_400.0;
            ctx.spawn_mission(category, Some(nation), MissionCause::Scheduled, delay);
        }
        Ok(())
    }

    fn run_production(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.production_minutes += 1;
        Ok(())
    }

    fn run_research(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.research_hours += 1;
        Ok(())
    }

    fn increase_alien_interest(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<()> {
        self.interest += 0.05;
        Ok(())
    }

    fn spread_xvi(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        if !ctx.state.xvi_started {
            return Ok(());
        }
        let spreading: Vec<NationId> = ctx
            .state
            .missions
            .iter()
            .filter(|m| m.stage == MissionStage::SpreadXvi)
            .filter_map(|m| m.nation.clone())
            .collect();
        for nation in spreading {
            let gain = 1 + ctx.rng.next_u64_below(3) as u32;
            let level = self.xvi.entry(nation).or_insert(0);
            *level = (*level + gain).min(MAX_XVI);
        }
        Ok(())
    }

    fn reduce_xvi(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        for level in self.xvi.values_mut() {
            if *level > 0 && ctx.rng.chance(0.2) {
                *level -= 1;
            }
        }
        Ok(())
    }

    fn run_market(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        // Selling recovered alien material.
        let sold = ctx.rng.next_u64_below(2_000) as i64;
        ctx.state.add_credits(sold);
        Ok(())
    }

    fn check_campaign_events(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        let unhappy = ctx
            .state
            .nations
            .iter()
            .filter(|n| n.happiness() < ctx.config.min_happiness)
            .count();
        if unhappy > 0 && ctx.rng.chance(0.1) {
            ctx.post_message(
                "Council",
                format!("{unhappy} nation(s) are questioning the funding of the project"),
                MessageCategory::Nation,
            );
        }
        Ok(())
    }

    fn update_nation_xvi_infection(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        for (nation, level) in &self.xvi {
            ctx.state.set_nation_xvi_infection(nation, *level);
        }
        Ok(())
    }

    fn auto_select_defence_targets(&mut self, ctx: &mut HookContext<'_>) -> SimResult<()> {
        // Interceptors engage detected missions once they are on the ground.
        let target = ctx
            .state
            .missions
            .iter()
            .find(|m| self.detected.contains(&m.id) && m.stage.harms_nation())
            .map(|m| m.id);
        let Some(id) = target else {
            return Ok(());
        };

        let aliens = 2 + ctx.rng.next_u64_below(6) as u32;
        let civilians = ctx.rng.next_u64_below(10) as u32;
        let won = ctx.rng.chance(0.7);
        let killed = if won { aliens } else { ctx.rng.next_u64_below(u64::from(aliens)) as u32 };
        let results = MissionResults {
            aliens_killed: killed,
            aliens_stunned: 0,
            aliens_survived: aliens - killed,
            civilians_survived: civilians / 2,
            civilians_killed: civilians - civilians / 2,
            civilians_killed_friendly_fire: 0,
        };
        ctx.resolve_mission(id, &results, won)?;
        self.interceptions += 1;
        self.detected.remove(&id);
        Ok(())
    }

    fn monthly_expenses(&mut self, _ctx: &mut HookContext<'_>) -> SimResult<Vec<ExpenseLine>> {
        Ok(vec![
            ExpenseLine::new("soldier salaries", 12 * 3_000),
            ExpenseLine::new("scientist salaries", 10 * 2_500),
            ExpenseLine::new("aircraft", 2 * 18_000),
        ])
    }
}

/// Prints player messages to stdout. In quiet mode only time stops
/// worth a player's attention are shown.
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl MessageSink for ConsoleSink {
    fn post_message(&mut self, title: &str, body: &str, category: MessageCategory) {
        let urgent = matches!(
            category,
            MessageCategory::CampaignLost | MessageCategory::BaseAttack | MessageCategory::TerrorSite
        );
        if !self.quiet || urgent {
            println!("  [{category:?}] {title}: {body}");
        }
    }
}
