//! Two-tier fairness rotation for forced yielding.
//!
//! When a negotiation collectively deadlocks, one agent must be forced to
//! shift. Selection follows a strict two-tier policy: agents who have never
//! had to commit are exhausted (FIFO) before any agent is asked to yield a
//! second time, and repeat-yielders rotate round-robin. No score or
//! randomness is involved, so no agent can be starved or over-selected under
//! sustained deadlock.

use std::collections::VecDeque;

use tracing::debug;

use crate::agent::AgentId;
use crate::error::CoordinationError;

/// The two rotation queues. An agent id lives in exactly one queue at any
/// time; promotion from `never_committed` to `committed` is one-way.
#[derive(Debug, Clone, Default)]
pub struct FairnessQueues {
    never_committed: VecDeque<AgentId>,
    committed: VecDeque<AgentId>,
}

impl FairnessQueues {
    /// Seed the queues with the campaign roster, in roster order.
    pub fn new(roster: impl IntoIterator<Item = AgentId>) -> Self {
        Self {
            never_committed: roster.into_iter().collect(),
            committed: VecDeque::new(),
        }
    }

    /// Note that an agent voluntarily committed.
    ///
    /// Moves it from `never_committed` to the back of `committed`. Agents
    /// already in `committed` are untouched: rotation happens only on forced
    /// selection, not on voluntary commitment.
    pub fn record_commitment_made(&mut self, agent: &str) {
        if let Some(pos) = self.never_committed.iter().position(|a| a == agent) {
            let id = self.never_committed.remove(pos).expect("position exists");
            debug!(agent, "promoted to committed queue");
            self.committed.push_back(id);
        }
    }

    /// Pick the agent forced to yield, restricted to the session's roster.
    ///
    /// The front-most active agent in `never_committed` goes first (and is
    /// promoted to the back of `committed`); once that tier is exhausted the
    /// front-most active agent in `committed` is used and rotated to its own
    /// tail. Fails with `NoEligibleAgent` only when neither queue holds an
    /// active agent.
    pub fn select_forced_agent(
        &mut self,
        active: &[AgentId],
    ) -> Result<AgentId, CoordinationError> {
        if let Some(pos) = self
            .never_committed
            .iter()
            .position(|a| active.contains(a))
        {
            let id = self.never_committed.remove(pos).expect("position exists");
            self.committed.push_back(id.clone());
            debug!(agent = %id, "forced selection from never-committed tier");
            return Ok(id);
        }
        if let Some(pos) = self.committed.iter().position(|a| active.contains(a)) {
            let id = self.committed.remove(pos).expect("position exists");
            self.committed.push_back(id.clone());
            debug!(agent = %id, "forced selection rotated committed tier");
            return Ok(id);
        }
        Err(CoordinationError::NoEligibleAgent)
    }

    /// Whether the agent has never been made to commit.
    pub fn is_never_committed(&self, agent: &str) -> bool {
        self.never_committed.iter().any(|a| a == agent)
    }

    pub fn never_committed_len(&self) -> usize {
        self.never_committed.len()
    }

    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }
}
