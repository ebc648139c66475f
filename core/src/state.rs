//! The campaign aggregate. One value per running campaign, owned by the
//! engine and lent to hooks through `HookContext`.
//!
//! RULE: Fields with invariants (date, credits, base count, loss reason)
//! are private. Everything outside the core mutates them through the
//! accessors below so the clamps hold.

use crate::{
    clock::CampaignClock,
    config::CampaignConfig,
    date::{SimDate, MONTHS_PER_YEAR},
    mission::MissionBoard,
    outcome::LossReason,
    types::{Credits, NationId},
};
use serde::{Deserialize, Serialize};

/// Credits can never exceed this amount.
pub const MAX_CREDITS: Credits = 10_000_000;

/// One month of a nation's record. Index 0 of `Nation::stats` is the
/// running month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NationMonth {
    pub in_use: bool,
    pub happiness: f64,
    /// XVI infection level reported by the collaborator, in percent.
    pub xvi_infection: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nation {
    pub id: NationId,
    pub name: String,
    pub max_funding: Credits,
    pub stats: [NationMonth; MONTHS_PER_YEAR],
}

impl Nation {
    pub fn new(id: impl Into<NationId>, name: impl Into<String>, max_funding: Credits, happiness: f64) -> Self {
        let mut stats = [NationMonth::default(); MONTHS_PER_YEAR];
        stats[0] = NationMonth {
            in_use: true,
            happiness: happiness.clamp(0.0, 1.0),
            xvi_infection: 0,
        };
        Self {
            id: id.into(),
            name: name.into(),
            max_funding,
            stats,
        }
    }

    pub fn happiness(&self) -> f64 {
        self.stats[0].happiness
    }

    /// Funding paid this month: `max_funding * happiness`, truncated.
    pub fn funding(&self) -> Credits {
        self.funding_for_month(0)
    }

    pub fn funding_for_month(&self, month: usize) -> Credits {
        debug_assert!(month < MONTHS_PER_YEAR);
        self.stats
            .get(month)
            .map(|s| (self.max_funding as f64 * s.happiness) as Credits)
            .unwrap_or(0)
    }
}

/// Running totals over the whole campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub missions_spawned: u32,
    pub missions_won: u32,
    pub missions_lost: u32,
    pub aliens_killed: u32,
    pub aliens_stunned: u32,
    pub civilians_killed: u32,
    pub months_closed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub campaign_id: String,
    date: SimDate,
    pub clock: CampaignClock,
    credits: Credits,
    /// Monthly billing guard. Cleared when the month closes, set again
    /// once the calendar day is past the first.
    pub paid: bool,
    pub missions: MissionBoard,
    pub nations: Vec<Nation>,
    base_count: u32,
    pub xvi_started: bool,
    /// Mean of the nations' current XVI infection, recomputed daily.
    pub average_xvi: f64,
    pub stats: CampaignStats,
    lost: Option<LossReason>,
}

impl CampaignState {
    /// Fresh campaign at the configured start date.
    pub fn from_config(config: &CampaignConfig) -> Self {
        let start = SimDate::from_calendar(
            config.start_date.year,
            config.start_date.month,
            config.start_date.day,
        );
        let nations = config
            .nations
            .iter()
            .map(|n| Nation::new(n.id.clone(), n.name.clone(), n.max_funding, n.initial_happiness))
            .collect();
        Self {
            campaign_id: config.id.clone(),
            date: start,
            clock: CampaignClock::new(config.initial_lapse),
            credits: config.initial_credits.min(MAX_CREDITS),
            paid: false,
            missions: MissionBoard::default(),
            nations,
            base_count: config.initial_bases,
            xvi_started: false,
            average_xvi: 0.0,
            stats: CampaignStats::default(),
            lost: None,
        }
    }

    // ── Date ───────────────────────────────────────────────────

    pub fn date(&self) -> SimDate {
        self.date
    }

    /// Replace the date wholesale. Meant for loading a saved campaign;
    /// the running clock moves the date through `advance` only.
    pub fn set_date(&mut self, date: SimDate) {
        self.date = SimDate::new(date.day, date.sec);
    }

    pub(crate) fn advance_date(&mut self, seconds: f64) {
        self.date = self.date.add_seconds(seconds);
    }

    // ── Credits ────────────────────────────────────────────────

    pub fn credits(&self) -> Credits {
        self.credits
    }

    /// Set credits, clamped to [`MAX_CREDITS`]. Debt is unbounded here;
    /// the loss check decides when it becomes fatal.
    pub fn set_credits(&mut self, credits: Credits) {
        if credits > MAX_CREDITS {
            log::warn!("credits {credits} clamped to {MAX_CREDITS}");
        }
        self.credits = credits.min(MAX_CREDITS);
    }

    pub fn add_credits(&mut self, delta: Credits) {
        self.set_credits(self.credits.saturating_add(delta));
    }

    pub fn can_afford(&self, cost: Credits) -> bool {
        self.credits >= cost
    }

    // ── Bases ──────────────────────────────────────────────────

    pub fn base_count(&self) -> u32 {
        self.base_count
    }

    pub fn set_base_count(&mut self, count: u32) {
        self.base_count = count;
    }

    pub fn destroy_base(&mut self) {
        self.base_count = self.base_count.saturating_sub(1);
    }

    // ── Nations ────────────────────────────────────────────────

    pub fn nation(&self, id: &str) -> Option<&Nation> {
        self.nations.iter().find(|n| n.id == id)
    }

    pub fn nation_mut(&mut self, id: &str) -> Option<&mut Nation> {
        self.nations.iter_mut().find(|n| n.id == id)
    }

    /// Record the XVI infection level the collaborator measured for a nation.
    pub fn set_nation_xvi_infection(&mut self, id: &str, infection: u32) -> bool {
        match self.nation_mut(id) {
            Some(nation) => {
                nation.stats[0].xvi_infection = infection;
                true
            }
            None => false,
        }
    }

    pub(crate) fn recompute_average_xvi(&mut self) {
        self.average_xvi = if self.nations.is_empty() {
            0.0
        } else {
            let sum: u64 = self
                .nations
                .iter()
                .map(|n| u64::from(n.stats[0].xvi_infection))
                .sum();
            sum as f64 / self.nations.len() as f64
        };
    }

    // ── Outcome ────────────────────────────────────────────────

    pub fn lost(&self) -> Option<LossReason> {
        self.lost
    }

    pub fn is_over(&self) -> bool {
        self.lost.is_some()
    }

    pub(crate) fn mark_lost(&mut self, reason: LossReason) {
        if self.lost.is_none() {
            self.lost = Some(reason);
        }
    }
}
