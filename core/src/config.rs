//! Campaign definition: difficulty constants, nations, mission timings and
//! budget figures. Read once at campaign start; the core never mutates it.

use crate::{
    clock::TimeLapse,
    error::{SimError, SimResult},
    types::{Credits, NationId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationConfig {
    pub id: NationId,
    pub name: String,
    /// Funding paid at full happiness.
    pub max_funding: Credits,
    pub initial_happiness: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

/// How long each mission stage lasts before its timer lapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionTimingConfig {
    /// UFO arriving from orbit.
    pub arrival_hours: u32,
    /// Aerial and ground reconnaissance, repositioning.
    pub recon_hours: u32,
    /// Terror, base attack, supply, XVI, intercept and harvest.
    pub objective_hours: u32,
    /// Building an alien base or subverting a government.
    pub base_building_hours: u32,
    pub return_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Monthly interest charged on negative credits (fraction).
    pub debt_interest: f64,
    pub administrative_cost: Credits,
    /// Monthly upkeep per base.
    pub base_upkeep: Credits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub id: String,
    pub name: String,
    pub start_date: StartDate,
    pub initial_credits: Credits,
    pub initial_bases: u32,
    pub initial_lapse: TimeLapse,
    /// Debt ceiling: the campaign is lost below `-negative_credits_until_lost`.
    pub negative_credits_until_lost: Credits,
    /// Average XVI infection (percent) above which the campaign is lost.
    pub max_allowed_xvi_rate_until_lost: f64,
    /// Happiness below which a nation counts as lost.
    pub min_happiness: f64,
    /// Price of a new base.
    pub base_cost: Credits,
    /// Happiness performance bonus per alien neutralised in a won mission.
    #[serde(default = "default_victory_bonus")]
    pub victory_bonus_per_alien: f64,
    pub nations: Vec<NationConfig>,
    pub missions: MissionTimingConfig,
    pub budget: BudgetConfig,
}

fn default_victory_bonus() -> f64 {
    0.1
}

impl CampaignConfig {
    /// Load `{data_dir}/campaigns/{campaign_id}.json`.
    /// In tests, use CampaignConfig::default_test().
    pub fn load(data_dir: &str, campaign_id: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/campaigns/{campaign_id}.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: CampaignConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject definitions the clock cannot run with. Called before the
    /// first tick; nothing inside the tick re-validates.
    pub fn validate(&self) -> SimResult<()> {
        if self.nations.is_empty() {
            return Err(SimError::invalid_config("campaign defines no nations"));
        }
        let mut seen = HashSet::new();
        for nation in &self.nations {
            if !seen.insert(nation.id.as_str()) {
                return Err(SimError::invalid_config(format!(
                    "duplicate nation id '{}'",
                    nation.id
                )));
            }
            if !(0.0..=1.0).contains(&nation.initial_happiness) {
                return Err(SimError::invalid_config(format!(
                    "nation '{}' initial happiness {} outside [0, 1]",
                    nation.id, nation.initial_happiness
                )));
            }
            if nation.max_funding < 0 {
                return Err(SimError::invalid_config(format!(
                    "nation '{}' has negative funding",
                    nation.id
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.min_happiness) {
            return Err(SimError::invalid_config("min_happiness outside [0, 1]"));
        }
        if self.negative_credits_until_lost < 0 {
            return Err(SimError::invalid_config("negative_credits_until_lost must be >= 0"));
        }
        if !(1..=12).contains(&self.start_date.month) || self.start_date.day == 0 {
            return Err(SimError::invalid_config(format!(
                "invalid start date {}-{}-{}",
                self.start_date.year, self.start_date.month, self.start_date.day
            )));
        }
        if self.budget.debt_interest < 0.0 {
            return Err(SimError::invalid_config("debt_interest must be >= 0"));
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let nation = |id: &str, name: &str, funding: Credits| NationConfig {
            id: id.into(),
            name: name.into(),
            max_funding: funding,
            initial_happiness: 0.6,
        };
        Self {
            id: "test".into(),
            name: "Test campaign".into(),
            start_date: StartDate { year: 2084, month: 3, day: 1 },
            initial_credits: 100_000,
            initial_bases: 1,
            initial_lapse: TimeLapse::FiveSeconds,
            negative_credits_until_lost: 200_000,
            max_allowed_xvi_rate_until_lost: 50.0,
            min_happiness: 0.15,
            base_cost: 350_000,
            victory_bonus_per_alien: 0.1,
            nations: vec![
                nation("europe", "Europe", 100_000),
                nation("northamerica", "North America", 120_000),
                nation("asia", "Asia", 90_000),
                nation("africa", "Africa", 50_000),
            ],
            missions: MissionTimingConfig {
                arrival_hours: 6,
                recon_hours: 12,
                objective_hours: 24,
                base_building_hours: 72,
                return_hours: 4,
            },
            budget: BudgetConfig {
                debt_interest: 0.005,
                administrative_cost: 5_000,
                base_upkeep: 20_000,
            },
        }
    }
}
