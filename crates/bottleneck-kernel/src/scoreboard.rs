//! Per-agent reward scores and violation counts.
//!
//! Rewards shape an agent's negotiation posture (a well-scored agent refuses
//! less and accepts more); violations count unhonored obligations and raise
//! an escalation signal past a fixed threshold. Both are keyed by agent id
//! here rather than stored on the `Agent` value.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::AgentId;

/// Violations beyond this count raise an escalation event.
pub const ESCALATION_THRESHOLD: u32 = 3;

/// Scoring events with fixed reward deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardEvent {
    /// Honored a previously made commitment.
    HonoredCommitment,
    /// Refused a request or proposal.
    RefusedRequest,
    /// Accepted an early-exit shift (negative offset).
    EarlyExitAccepted,
    /// Accepted a late-exit shift (positive offset).
    LateExitAccepted,
    /// Chose the on-time slot while the corridor was congested.
    OnTimeInCongestion,
    /// Became debtor on a new commitment.
    CommitmentDebtor,
    /// Became creditor on a new commitment.
    CommitmentCreditor,
}

impl RewardEvent {
    /// Fixed delta applied to the agent's reward score.
    pub fn delta(self) -> i64 {
        match self {
            Self::HonoredCommitment => 2,
            Self::RefusedRequest => -2,
            Self::EarlyExitAccepted => 4,
            Self::LateExitAccepted => 2,
            Self::OnTimeInCongestion => -2,
            Self::CommitmentDebtor => -1,
            Self::CommitmentCreditor => 1,
        }
    }
}

/// Reward and violation tracking for all agents in a campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    rewards: HashMap<AgentId, i64>,
    violations: HashMap<AgentId, u32>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a scoring event; returns the agent's new reward score.
    pub fn apply(&mut self, agent: &str, event: RewardEvent) -> i64 {
        let score = self.rewards.entry(agent.to_string()).or_insert(0);
        *score += event.delta();
        *score
    }

    /// Current reward score (zero for unseen agents).
    pub fn reward(&self, agent: &str) -> i64 {
        self.rewards.get(agent).copied().unwrap_or(0)
    }

    /// Increment the agent's violation count.
    ///
    /// Returns true exactly when the post-increment count exceeds the
    /// escalation threshold.
    pub fn record_violation(&mut self, agent: &str) -> bool {
        let count = self.violations.entry(agent.to_string()).or_insert(0);
        *count += 1;
        let escalated = *count > ESCALATION_THRESHOLD;
        if escalated {
            warn!(agent, violations = *count, "violation escalation");
        }
        escalated
    }

    /// Violation count for one agent.
    pub fn violation_count(&self, agent: &str) -> u32 {
        self.violations.get(agent).copied().unwrap_or(0)
    }

    /// Sum of all violation counts.
    pub fn total_violations(&self) -> u32 {
        self.violations.values().sum()
    }

    /// Per-agent violation counts in deterministic (sorted) order.
    pub fn per_agent_violations(&self) -> BTreeMap<AgentId, u32> {
        self.violations
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Per-agent reward scores in deterministic (sorted) order.
    pub fn per_agent_rewards(&self) -> BTreeMap<AgentId, i64> {
        self.rewards.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
