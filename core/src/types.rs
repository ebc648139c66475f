//! Shared primitive types used across the entire campaign core.

/// Whole simulated seconds. Slices handed to collaborators are always whole.
pub type GameSeconds = u64;

/// Stable identifier of a nation, as written in the campaign definition.
pub type NationId = String;

/// Index-stable identifier of a mission. Never reused within a campaign.
pub type MissionId = u32;

/// Campaign money. Signed: the player may go into debt.
pub type Credits = i64;

/// The canonical run identifier.
pub type RunId = String;
