use serde::{Deserialize, Serialize};

use crate::{
    clock::TimeLapse,
    mission::{MissionCategory, MissionResults},
    types::{Credits, MissionId, NationId},
};

/// All player-issued commands.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetLapse { lapse: TimeLapse },
    Faster,
    Slower,
    SetScale { scale: f64 },

    // ── Economy and bases ─────────────────────────
    AddCredits { amount: Credits },
    SetBaseCount { count: u32 },

    // ── Missions ──────────────────────────────────
    SpawnMission {
        category:    MissionCategory,
        nation:      Option<NationId>,
        delay_hours: u32,
    },
    ResolveMission {
        mission_id: MissionId,
        won:        bool,
        results:    MissionResults,
    },
    AbortMission {
        mission_id: MissionId,
        reason:     String,
    },
    MarkUfoCrashed { mission_id: MissionId },
    DiscoverAlienBase { mission_id: MissionId },
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause                  => "pause",
            Self::Resume                 => "resume",
            Self::SetLapse { .. }        => "set_lapse",
            Self::Faster                 => "faster",
            Self::Slower                 => "slower",
            Self::SetScale { .. }        => "set_scale",
            Self::AddCredits { .. }      => "add_credits",
            Self::SetBaseCount { .. }    => "set_base_count",
            Self::SpawnMission { .. }    => "spawn_mission",
            Self::ResolveMission { .. }  => "resolve_mission",
            Self::AbortMission { .. }    => "abort_mission",
            Self::MarkUfoCrashed { .. }  => "mark_ufo_crashed",
            Self::DiscoverAlienBase { .. } => "discover_alien_base",
        }
    }

    /// Clock commands stay available after the campaign is lost.
    pub fn changes_campaign(&self) -> bool {
        !matches!(
            self,
            Self::Pause | Self::Resume | Self::SetLapse { .. } | Self::Faster | Self::Slower | Self::SetScale { .. }
        )
    }
}
