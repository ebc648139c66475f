use thiserror::Error;

use crate::types::{MissionId, NationId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid campaign configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Mission {id} not found")]
    UnknownMission { id: MissionId },

    #[error("Nation '{id}' not found")]
    UnknownNation { id: NationId },

    #[error("Campaign is over: {reason}")]
    CampaignOver { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
