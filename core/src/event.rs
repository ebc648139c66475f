//! Campaign events: everything observable that happened during `advance`.
//!
//! RULE: Every state change the core makes is reported as a CampaignEvent.
//! Hooks report their own effects through `HookContext::emit`.

use crate::{
    clock::TimeLapse,
    mission::{MissionCategory, MissionStage},
    nation::HappinessBand,
    outcome::LossReason,
    rng::SubsystemSlot,
    types::{Credits, MissionId, NationId, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a campaign.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
        day: u32,
    },
    DayElapsed {
        day: u32,
        average_xvi: f64,
    },
    MonthClosed {
        day: u32,
        year: u32,
        month: u32,
    },
    TimeStopped {
        day: u32,
        reason: String,
    },
    LapseChanged {
        day: u32,
        lapse: TimeLapse,
    },
    HookFailed {
        day: u32,
        slot: SubsystemSlot,
        error: String,
    },
    PlayerCommandReceived {
        day: u32,
        command_type: String,
    },

    // ── Mission events ─────────────────────────────
    MissionSpawned {
        day: u32,
        mission_id: MissionId,
        category: MissionCategory,
        nation: Option<NationId>,
    },
    MissionStageChanged {
        day: u32,
        mission_id: MissionId,
        from: MissionStage,
        to: MissionStage,
    },
    MissionRemoved {
        day: u32,
        mission_id: MissionId,
        category: MissionCategory,
        reason: String,
    },
    MissionResolved {
        day: u32,
        mission_id: MissionId,
        won: bool,
        performance: f64,
    },

    // ── Nation and economy events ──────────────────
    HappinessChanged {
        day: u32,
        nation: NationId,
        old: f64,
        new: f64,
        band: HappinessBand,
    },
    BudgetSettled {
        day: u32,
        income: Credits,
        expenses: Credits,
        credits_after: Credits,
    },
    CampaignLost {
        day: u32,
        reason: LossReason,
    },

    // ── Player-facing messages ─────────────────────
    MessagePosted {
        day: u32,
        title: String,
        body: String,
        category: MessageCategory,
    },
}

impl CampaignEvent {
    /// Stable name of the variant, used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }        => "run_initialized",
            Self::DayElapsed { .. }            => "day_elapsed",
            Self::MonthClosed { .. }           => "month_closed",
            Self::TimeStopped { .. }           => "time_stopped",
            Self::LapseChanged { .. }          => "lapse_changed",
            Self::HookFailed { .. }            => "hook_failed",
            Self::PlayerCommandReceived { .. } => "player_command_received",
            Self::MissionSpawned { .. }        => "mission_spawned",
            Self::MissionStageChanged { .. }   => "mission_stage_changed",
            Self::MissionRemoved { .. }        => "mission_removed",
            Self::MissionResolved { .. }       => "mission_resolved",
            Self::HappinessChanged { .. }      => "happiness_changed",
            Self::BudgetSettled { .. }         => "budget_settled",
            Self::CampaignLost { .. }          => "campaign_lost",
            Self::MessagePosted { .. }         => "message_posted",
        }
    }

    /// Campaign day the event happened on.
    pub fn day(&self) -> u32 {
        match self {
            Self::RunInitialized { day, .. }
            | Self::DayElapsed { day, .. }
            | Self::MonthClosed { day, .. }
            | Self::TimeStopped { day, .. }
            | Self::LapseChanged { day, .. }
            | Self::HookFailed { day, .. }
            | Self::PlayerCommandReceived { day, .. }
            | Self::MissionSpawned { day, .. }
            | Self::MissionStageChanged { day, .. }
            | Self::MissionRemoved { day, .. }
            | Self::MissionResolved { day, .. }
            | Self::HappinessChanged { day, .. }
            | Self::BudgetSettled { day, .. }
            | Self::CampaignLost { day, .. }
            | Self::MessagePosted { day, .. } => *day,
        }
    }
}

/// How a posted message is presented to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Standard,
    Info,
    Promotion,
    Production,
    UfoSpotted,
    TerrorSite,
    BaseAttack,
    Research,
    Transfer,
    Nation,
    Funding,
    CampaignLost,
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub day: u32,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized CampaignEvent
}
