//! Nation happiness, monthly history and the monthly budget.

use crate::{
    config::CampaignConfig,
    date::MONTHS_PER_YEAR,
    event::{CampaignEvent, MessageCategory},
    mission::MissionResults,
    state::{CampaignState, Nation},
    types::{Credits, NationId},
};
use serde::{Deserialize, Serialize};

/// Happiness lost per day for every alien mission active on a nation's soil.
pub const HAPPINESS_ALIEN_MISSION_LOSS: f64 = -0.02;
/// Happiness lost when the aliens finish subverting a government.
pub const HAPPINESS_SUBVERSION_LOSS: f64 = -0.15;
/// Upper bound of the happiness swing a single battle can cause.
pub const HAPPINESS_MAX_MISSION_IMPACT: f64 = 0.07;
/// Nations other than the one a battle happened in feel a fifth of it.
const NEIGHBOUR_DIVISOR: f64 = 5.0;

/// Readable step function over happiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HappinessBand {
    GivingUp,
    Furious,
    Angry,
    Mad,
    Upset,
    Tolerant,
    Neutral,
    Content,
    Pleased,
    Happy,
    Exuberant,
}

impl HappinessBand {
    pub fn from_happiness(happiness: f64) -> Self {
        match happiness {
            h if h < 0.015 => Self::GivingUp,
            h if h < 0.025 => Self::Furious,
            h if h < 0.04  => Self::Angry,
            h if h < 0.06  => Self::Mad,
            h if h < 0.10  => Self::Upset,
            h if h < 0.20  => Self::Tolerant,
            h if h < 0.30  => Self::Neutral,
            h if h < 0.50  => Self::Content,
            h if h < 0.70  => Self::Pleased,
            h if h < 0.95  => Self::Happy,
            _              => Self::Exuberant,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GivingUp  => "Giving up",
            Self::Furious   => "Furious",
            Self::Angry     => "Angry",
            Self::Mad       => "Mad",
            Self::Upset     => "Upset",
            Self::Tolerant  => "Tolerant",
            Self::Neutral   => "Neutral",
            Self::Content   => "Content",
            Self::Pleased   => "Pleased",
            Self::Happy     => "Happy",
            Self::Exuberant => "Exuberant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    BandChanged,
    BelowMidpoint,
    BelowMinimum,
}

/// A happiness change worth telling the player about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HappinessNotice {
    pub nation: NationId,
    pub kind: NoticeKind,
    pub old: f64,
    pub new: f64,
    pub old_band: HappinessBand,
    pub new_band: HappinessBand,
}

impl HappinessNotice {
    pub fn title(&self) -> &'static str {
        "Nation changed happiness"
    }

    pub fn body(&self, nation_name: &str) -> String {
        match self.kind {
            NoticeKind::BandChanged => format!(
                "Nation {nation_name} changed happiness from {} to {}",
                self.old_band.label(),
                self.new_band.label()
            ),
            NoticeKind::BelowMidpoint => format!(
                "Nation {nation_name} changed happiness to {}",
                self.new_band.label()
            ),
            NoticeKind::BelowMinimum => format!(
                "Happiness of nation {nation_name} is {} and less than the minimal happiness allowed in this campaign",
                self.new_band.label()
            ),
        }
    }
}

/// Store a new happiness for the running month.
///
/// The value is clamped to `[0, 1]`; a NaN keeps the previous value.
/// Returns a notice when the band changed, when happiness dropped below the
/// midpoint between `min_happiness` and 1, or when it dropped below
/// `min_happiness`. Small moves inside a band stay silent.
pub fn set_happiness(nation: &mut Nation, min_happiness: f64, raw: f64) -> Option<HappinessNotice> {
    let old = nation.happiness();
    let old_band = HappinessBand::from_happiness(old);
    let middle = (min_happiness + 1.0) / 2.0;

    if raw.is_nan() {
        log::warn!("nation={} ignoring NaN happiness", nation.id);
        return None;
    }
    let new = raw.clamp(0.0, 1.0);
    nation.stats[0].happiness = new;
    nation.stats[0].in_use = true;

    let new_band = HappinessBand::from_happiness(new);
    let kind = if old_band != new_band {
        NoticeKind::BandChanged
    } else if old > middle && new < middle {
        NoticeKind::BelowMidpoint
    } else if new < min_happiness && old > min_happiness {
        NoticeKind::BelowMinimum
    } else {
        return None;
    };

    Some(HappinessNotice {
        nation: nation.id.clone(),
        kind,
        old,
        new,
        old_band,
        new_band,
    })
}

/// Shift the monthly history one slot towards the past. Index 11 is
/// dropped and index 0 is duplicated into index 1. Copies run from the
/// oldest slot down so no month is overwritten before it was moved.
pub fn backup_monthly(nation: &mut Nation) {
    for i in (1..MONTHS_PER_YEAR).rev() {
        nation.stats[i] = nation.stats[i - 1];
    }
}

/// Apply a happiness change and record it.
fn apply_happiness(
    nation: &mut Nation,
    min_happiness: f64,
    raw: f64,
    day: u32,
    events: &mut Vec<CampaignEvent>,
) {
    let old = nation.happiness();
    let notice = set_happiness(nation, min_happiness, raw);
    let new = nation.happiness();
    if new != old {
        events.push(CampaignEvent::HappinessChanged {
            day,
            nation: nation.id.clone(),
            old,
            new,
            band: HappinessBand::from_happiness(new),
        });
    }
    if let Some(notice) = notice {
        events.push(CampaignEvent::MessagePosted {
            day,
            title: notice.title().to_string(),
            body: notice.body(&nation.name),
            category: MessageCategory::Nation,
        });
    }
}

/// Add `delta` to one nation's happiness.
pub fn adjust_happiness(
    state: &mut CampaignState,
    config: &CampaignConfig,
    nation_id: &str,
    delta: f64,
    events: &mut Vec<CampaignEvent>,
) -> bool {
    let day = state.date().day;
    match state.nation_mut(nation_id) {
        Some(nation) => {
            let raw = nation.happiness() + delta;
            apply_happiness(nation, config.min_happiness, raw, day, events);
            true
        }
        None => {
            log::warn!("day={day} happiness change for unknown nation '{nation_id}'");
            false
        }
    }
}

/// Daily happiness loss for every alien mission actively harming a nation.
pub fn daily_decay(state: &mut CampaignState, config: &CampaignConfig, events: &mut Vec<CampaignEvent>) {
    let affected: Vec<NationId> = state
        .missions
        .iter()
        .filter(|m| m.stage.harms_nation())
        .filter_map(|m| m.nation.clone())
        .collect();

    for nation_id in affected {
        adjust_happiness(state, config, &nation_id, HAPPINESS_ALIEN_MISSION_LOSS, events);
        log::debug!("day={} happiness of {nation_id} decreased by alien activity", state.date().day);
    }
}

/// Score a finished battle and move every nation's happiness by it.
/// The nation the battle happened in takes the full effect, the others a
/// fifth. Returns the computed performance.
pub fn handle_mission_result(
    state: &mut CampaignState,
    config: &CampaignConfig,
    affected: Option<&str>,
    results: &MissionResults,
    won: bool,
    events: &mut Vec<CampaignEvent>,
) -> f64 {
    let civilian_sum = f64::from(
        results.civilians_survived + results.civilians_killed + results.civilians_killed_friendly_fire,
    );
    let alien_sum =
        f64::from(results.aliens_survived + results.aliens_killed + results.aliens_stunned);
    let neutralised = f64::from(results.aliens_killed + results.aliens_stunned);

    let performance_civilian = if civilian_sum <= 1.0 {
        0.0
    } else {
        (2.0 * civilian_sum
            - f64::from(results.civilians_killed)
            - 2.0 * f64::from(results.civilians_killed_friendly_fire))
            * 3.0
            / (2.0 * civilian_sum)
            - 2.0
    };
    let performance_alien = if won {
        neutralised * config.victory_bonus_per_alien
    } else {
        neutralised - alien_sum
    };
    let performance = performance_civilian + performance_alien;

    let delta = (0.004 * civilian_sum + 0.004 * alien_sum).min(HAPPINESS_MAX_MISSION_IMPACT);

    let day = state.date().day;
    let min_happiness = config.min_happiness;
    for nation in state.nations.iter_mut() {
        let factor = if affected == Some(nation.id.as_str()) {
            delta
        } else {
            delta / NEIGHBOUR_DIVISOR
        };
        let raw = nation.happiness() + performance * factor;
        apply_happiness(nation, min_happiness, raw, day, events);
    }
    performance
}

/// One named cost of the monthly bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub label: String,
    pub amount: Credits,
}

impl ExpenseLine {
    pub fn new(label: impl Into<String>, amount: Credits) -> Self {
        Self { label: label.into(), amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatement {
    pub credits_before: Credits,
    pub income: Credits,
    pub expenses: Vec<ExpenseLine>,
    pub credits_after: Credits,
}

impl BudgetStatement {
    pub fn total_expenses(&self) -> Credits {
        self.expenses.iter().map(|e| e.amount).sum()
    }
}

/// Monthly settlement: collect nation funding, pay base upkeep,
/// administration, the collaborator's expense lines and interest on debt.
pub fn settle_budget(
    state: &mut CampaignState,
    config: &CampaignConfig,
    extra: Vec<ExpenseLine>,
    events: &mut Vec<CampaignEvent>,
) -> BudgetStatement {
    let day = state.date().day;
    let credits_before = state.credits();
    let mut income: Credits = 0;

    for nation in &state.nations {
        let funding = nation.funding();
        income += funding;
        events.push(CampaignEvent::MessagePosted {
            day,
            title: "Notice".into(),
            body: format!(
                "Gained {funding} credits from nation {} ({})",
                nation.name,
                HappinessBand::from_happiness(nation.happiness()).label()
            ),
            category: MessageCategory::Funding,
        });
    }

    let mut expenses = extra;
    let upkeep = config.budget.base_upkeep * Credits::from(state.base_count());
    if upkeep != 0 {
        expenses.push(ExpenseLine::new("base upkeep", upkeep));
    }
    expenses.push(ExpenseLine::new("administrative overhead", config.budget.administrative_cost));
    if credits_before < 0 {
        let interest = (-credits_before as f64 * config.budget.debt_interest).ceil() as Credits;
        expenses.push(ExpenseLine::new("interest on debt", interest));
    }

    for line in expenses.iter().filter(|l| l.amount != 0) {
        events.push(CampaignEvent::MessagePosted {
            day,
            title: "Notice".into(),
            body: format!("Paid {} credits for {}", line.amount, line.label),
            category: MessageCategory::Funding,
        });
    }

    let total: Credits = expenses.iter().map(|e| e.amount).sum();
    state.set_credits(credits_before - total + income);

    let statement = BudgetStatement {
        credits_before,
        income,
        expenses,
        credits_after: state.credits(),
    };
    events.push(CampaignEvent::BudgetSettled {
        day,
        income,
        expenses: total,
        credits_after: statement.credits_after,
    });
    log::info!(
        "day={day} budget settled: income={income} expenses={total} credits={}",
        statement.credits_after
    );
    statement
}

