//! End-of-tick loss evaluation.
//!
//! `check` is a read-only predicate over the campaign. The engine records
//! the verdict; nothing here mutates state.

use crate::{config::CampaignConfig, state::CampaignState};
use serde::{Deserialize, Serialize};

/// Why a campaign was lost. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Debt,
    BasesLost,
    XviInfection,
    NationsUnhappy,
}

impl LossReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Debt => "You've gone too far into debt.",
            Self::BasesLost => {
                "You've lost your bases and don't have enough money to build new ones."
            }
            Self::XviInfection => "You have failed in your charter to protect Earth. Our home \
                 and our people have fallen to the alien infection.",
            Self::NationsUnhappy => {
                "Under your command, half of the nations lost trust and withdrew their funding."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CampaignOutcome {
    Continue,
    Lost(LossReason),
}

impl CampaignOutcome {
    pub fn is_lost(&self) -> bool {
        matches!(self, Self::Lost(_))
    }
}

/// Evaluate the loss conditions, short-circuiting on the first that holds.
pub fn check(state: &CampaignState, config: &CampaignConfig) -> CampaignOutcome {
    let ceiling = config.negative_credits_until_lost;
    let credits = state.credits();

    if credits < -ceiling {
        return CampaignOutcome::Lost(LossReason::Debt);
    }

    if state.base_count() == 0 && credits < config.base_cost - ceiling {
        return CampaignOutcome::Lost(LossReason::BasesLost);
    }

    if state.xvi_started && state.average_xvi > config.max_allowed_xvi_rate_until_lost {
        return CampaignOutcome::Lost(LossReason::XviInfection);
    }

    let total = state.nations.len();
    if total > 0 {
        let unhappy = state
            .nations
            .iter()
            .filter(|n| n.happiness() < config.min_happiness)
            .count();
        if unhappy * 2 >= total {
            return CampaignOutcome::Lost(LossReason::NationsUnhappy);
        }
    }

    CampaignOutcome::Continue
}
