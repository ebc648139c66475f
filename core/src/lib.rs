//! geoscape-core: campaign clock and event scheduling for a strategy
//! campaign. The host calls `CampaignEngine::advance` once per frame;
//! everything the core does not own is reached through `CampaignHooks`
//! and `MessageSink`.

pub mod clock;
pub mod command;
pub mod config;
pub mod date;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod mission;
pub mod nation;
pub mod notify;
pub mod outcome;
pub mod periodic;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod subsystem;
pub mod types;
