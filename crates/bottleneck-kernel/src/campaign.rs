//! Long-lived campaign state aggregate.
//!
//! One `CampaignState` is created at campaign start and torn down after the
//! final report. The session scheduler and decision resolver receive it by
//! mutable reference and must not retain state across sessions themselves;
//! single ownership plus strict turn ordering is what makes the engine safe
//! without locks.

use crate::agent::{Agent, AgentId};
use crate::capacity::CapacityModel;
use crate::fairness::FairnessQueues;
use crate::ledger::CommitmentLedger;
use crate::scoreboard::ScoreBoard;

/// Aggregate of all state that outlives a single session.
#[derive(Debug, Clone)]
pub struct CampaignState {
    /// All classroom agents known to the campaign, in roster order.
    classrooms: Vec<Agent>,
    pub ledger: CommitmentLedger,
    pub queues: FairnessQueues,
    pub scores: ScoreBoard,
    pub capacity: CapacityModel,
    /// Current week number, 1-based; advanced by the campaign driver.
    pub week: u32,
}

impl CampaignState {
    /// Create fresh campaign state for a roster of classroom agents.
    pub fn new(classrooms: Vec<Agent>, baseline_capacity: u32) -> Self {
        let queue_seed: Vec<AgentId> = classrooms.iter().map(|a| a.name.clone()).collect();
        Self {
            classrooms,
            ledger: CommitmentLedger::new(),
            queues: FairnessQueues::new(queue_seed),
            scores: ScoreBoard::new(),
            capacity: CapacityModel::new(baseline_capacity),
            week: 1,
        }
    }

    /// Look up a classroom agent by name.
    pub fn classroom(&self, name: &str) -> Option<&Agent> {
        self.classrooms.iter().find(|a| a.name == name)
    }

    /// The full classroom roster in order.
    pub fn classrooms(&self) -> &[Agent] {
        &self.classrooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_fairness_queues_in_roster_order() {
        let mut state = CampaignState::new(
            vec![
                Agent::classroom("C1", 120),
                Agent::classroom("C2", 80),
            ],
            100,
        );
        let active = vec!["C1".to_string(), "C2".to_string()];
        assert_eq!(state.queues.select_forced_agent(&active).unwrap(), "C1");
        assert!(state.classroom("C2").is_some());
        assert!(state.classroom("B").is_none());
        assert_eq!(state.capacity.baseline(), 100);
        assert_eq!(state.week, 1);
    }
}
