//! Bottleneck Kernel: Coordination State for Staggered Classroom Exits
//!
//! This crate implements the state engine behind negotiated exit scheduling:
//! a commitment ledger with fulfillment tracking, a two-tier fairness queue,
//! per-agent reward/violation scoring, and a bottleneck capacity model.
//!
//! The kernel is synchronous and I/O-free. The negotiation turn loop and the
//! dialogue layer live in the experiment crate and drive this state through
//! `CampaignState`.

pub mod agent;
pub mod campaign;
pub mod capacity;
pub mod error;
pub mod fairness;
pub mod ledger;
pub mod scoreboard;

pub use agent::{Agent, AgentId, AgentRole};
pub use campaign::CampaignState;
pub use capacity::{CapacityModel, CongestionTier};
pub use error::CoordinationError;
pub use fairness::FairnessQueues;
pub use ledger::{Commitment, CommitmentKey, CommitmentLedger};
pub use scoreboard::{RewardEvent, ScoreBoard};
