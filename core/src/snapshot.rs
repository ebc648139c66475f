//! Snapshot serialization: full campaign state to/from JSON.
//!
//! A snapshot is taken at every month close. It captures everything
//! needed to resume the campaign without replaying it, including the
//! RNG stream counter.

use crate::{
    rng::RngBank,
    state::CampaignState,
    types::RunId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub run_id: RunId,
    pub day: u32,
    pub rng: RngBank,
    pub state: CampaignState,
}
