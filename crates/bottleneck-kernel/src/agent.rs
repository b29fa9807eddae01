//! Agent identity and roles.

use serde::{Deserialize, Serialize};

/// Agents are identified by name (e.g. "C1", "B").
pub type AgentId = String;

/// Role of an agent in a coordination session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Observes the bottleneck and broadcasts status; never negotiates.
    Monitor,
    /// Negotiates exit timing on behalf of one classroom.
    Classroom,
}

/// A coordination agent.
///
/// Immutable for the campaign's duration. Reward and violation state is
/// tracked in the `ScoreBoard` keyed by `name`, never embedded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: AgentId,
    pub role: AgentRole,
    /// Static attendance count; zero for the monitor.
    pub attendance: u32,
}

impl Agent {
    /// Create the bottleneck monitor agent.
    pub fn monitor(name: impl Into<AgentId>) -> Self {
        Self {
            name: name.into(),
            role: AgentRole::Monitor,
            attendance: 0,
        }
    }

    /// Create a classroom agent with a fixed attendance count.
    pub fn classroom(name: impl Into<AgentId>, attendance: u32) -> Self {
        Self {
            name: name.into(),
            role: AgentRole::Classroom,
            attendance,
        }
    }

    pub fn is_classroom(&self) -> bool {
        self.role == AgentRole::Classroom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        let b = Agent::monitor("B");
        let c = Agent::classroom("C1", 120);
        assert!(!b.is_classroom());
        assert!(c.is_classroom());
        assert_eq!(b.attendance, 0);
        assert_eq!(c.attendance, 120);
    }
}
