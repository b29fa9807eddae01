//! Commitment ledger: future-dated obligations between agents.
//!
//! A commitment records that a debtor owes a creditor a time adjustment for a
//! specific (day, slot) in a later week. Keys are unique among unfulfilled
//! entries; re-committing the same key accumulates minutes. Fulfilled entries
//! are never deleted, so the ledger doubles as an audit history.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::AgentId;
use crate::error::CoordinationError;

/// Identity of a commitment: who owes whom, for which timetable cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitmentKey {
    pub debtor: AgentId,
    pub creditor: AgentId,
    pub day: String,
    pub slot: String,
}

/// A recorded obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commitment {
    pub key: CommitmentKey,
    /// Minutes owed: a signed, nonzero exit-time offset.
    pub minutes: i32,
    /// Week the commitment was (first) made.
    pub week_made: u32,
    pub fulfilled: bool,
}

/// Insertion-ordered store of commitments.
///
/// Linear scans are fine here: a campaign produces at most a few dozen
/// entries, and insertion order is what makes `pending_for` deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitmentLedger {
    entries: Vec<Commitment>,
}

impl CommitmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or accumulate) a commitment.
    ///
    /// Rejects self-commitments and zero-minute requests. If an unfulfilled
    /// entry with the same key exists, its minutes accumulate; a fulfilled
    /// entry with the same key stays in history and a fresh entry is created.
    pub fn add_commitment(
        &mut self,
        debtor: &str,
        creditor: &str,
        day: &str,
        slot: &str,
        minutes: i32,
        week: u32,
    ) -> Result<(), CoordinationError> {
        if debtor == creditor {
            return Err(CoordinationError::InvalidCommitment(format!(
                "{debtor} cannot owe itself"
            )));
        }
        if minutes == 0 {
            return Err(CoordinationError::InvalidCommitment(
                "zero minutes owed".to_string(),
            ));
        }

        if let Some(existing) = self.entries.iter_mut().find(|c| {
            !c.fulfilled
                && c.key.debtor == debtor
                && c.key.creditor == creditor
                && c.key.day == day
                && c.key.slot == slot
        }) {
            existing.minutes += minutes;
            debug!(
                debtor,
                creditor,
                minutes = existing.minutes,
                "accumulated commitment"
            );
            return Ok(());
        }

        debug!(debtor, creditor, day, slot, minutes, week, "new commitment");
        self.entries.push(Commitment {
            key: CommitmentKey {
                debtor: debtor.to_string(),
                creditor: creditor.to_string(),
                day: day.to_string(),
                slot: slot.to_string(),
            },
            minutes,
            week_made: week,
            fulfilled: false,
        });
        Ok(())
    }

    /// Unfulfilled obligations this agent must honor for the given cell,
    /// as (creditor, minutes) in insertion order.
    pub fn pending_for(&self, agent: &str, day: &str, slot: &str) -> Vec<(AgentId, i32)> {
        self.entries
            .iter()
            .filter(|c| {
                !c.fulfilled && c.key.debtor == agent && c.key.day == day && c.key.slot == slot
            })
            .map(|c| (c.key.creditor.clone(), c.minutes))
            .collect()
    }

    /// Obligations due in the given week: unfulfilled entries for the cell
    /// that were made in an earlier week. A commitment is never repaid in the
    /// week it was made.
    pub fn due_for(&self, agent: &str, day: &str, slot: &str, week: u32) -> Vec<(AgentId, i32)> {
        self.entries
            .iter()
            .filter(|c| {
                !c.fulfilled
                    && c.week_made < week
                    && c.key.debtor == agent
                    && c.key.day == day
                    && c.key.slot == slot
            })
            .map(|c| (c.key.creditor.clone(), c.minutes))
            .collect()
    }

    /// Mark a commitment fulfilled.
    ///
    /// Returns true if the key existed and was unfulfilled; repeat calls on
    /// the same key are no-ops returning false.
    pub fn fulfill(&mut self, debtor: &str, creditor: &str, day: &str, slot: &str) -> bool {
        match self.entries.iter_mut().find(|c| {
            !c.fulfilled
                && c.key.debtor == debtor
                && c.key.creditor == creditor
                && c.key.day == day
                && c.key.slot == slot
        }) {
            Some(entry) => {
                entry.fulfilled = true;
                debug!(debtor, creditor, day, slot, "commitment fulfilled");
                true
            }
            None => false,
        }
    }

    /// Number of unfulfilled commitments.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|c| !c.fulfilled).count()
    }

    /// Number of fulfilled commitments.
    pub fn fulfilled_count(&self) -> usize {
        self.entries.iter().filter(|c| c.fulfilled).count()
    }

    /// Total commitments ever made (audit view).
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    /// Full history, fulfilled entries included, in insertion order.
    pub fn history(&self) -> &[Commitment] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_self_commitment() {
        let mut ledger = CommitmentLedger::new();
        let err = ledger
            .add_commitment("C1", "C1", "Monday", "11:00", 2, 1)
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidCommitment(_)));
    }

    #[test]
    fn test_rejects_zero_minutes() {
        let mut ledger = CommitmentLedger::new();
        let err = ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 0, 1)
            .unwrap_err();
        assert!(matches!(err, CoordinationError::InvalidCommitment(_)));
    }

    #[test]
    fn test_same_key_accumulates() {
        let mut ledger = CommitmentLedger::new();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 2, 1)
            .unwrap();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 4, 1)
            .unwrap();
        assert_eq!(ledger.total_count(), 1);
        assert_eq!(
            ledger.pending_for("C1", "Monday", "11:00"),
            vec![("C2".to_string(), 6)]
        );
    }

    #[test]
    fn test_pending_for_insertion_order() {
        let mut ledger = CommitmentLedger::new();
        ledger
            .add_commitment("C1", "C3", "Monday", "11:00", 2, 1)
            .unwrap();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 4, 1)
            .unwrap();
        ledger
            .add_commitment("C2", "C1", "Monday", "11:00", 2, 1)
            .unwrap();
        let pending = ledger.pending_for("C1", "Monday", "11:00");
        assert_eq!(
            pending,
            vec![("C3".to_string(), 2), ("C2".to_string(), 4)]
        );
    }

    #[test]
    fn test_due_only_in_later_weeks() {
        let mut ledger = CommitmentLedger::new();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 2, 1)
            .unwrap();
        // Not due in the week it was made, due from the next week on.
        assert!(ledger.due_for("C1", "Monday", "11:00", 1).is_empty());
        assert_eq!(
            ledger.due_for("C1", "Monday", "11:00", 2),
            vec![("C2".to_string(), 2)]
        );
        // Pending regardless of week.
        assert_eq!(
            ledger.pending_for("C1", "Monday", "11:00"),
            vec![("C2".to_string(), 2)]
        );
    }

    #[test]
    fn test_fulfill_is_idempotent() {
        let mut ledger = CommitmentLedger::new();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 2, 1)
            .unwrap();
        assert!(ledger.fulfill("C1", "C2", "Monday", "11:00"));
        assert!(!ledger.fulfill("C1", "C2", "Monday", "11:00"));
        assert_eq!(ledger.active_count(), 0);
        assert_eq!(ledger.fulfilled_count(), 1);
        // History retains the fulfilled entry for audit.
        assert_eq!(ledger.history().len(), 1);
        assert!(ledger.history()[0].fulfilled);
    }

    #[test]
    fn test_fulfill_unknown_key() {
        let mut ledger = CommitmentLedger::new();
        assert!(!ledger.fulfill("C1", "C2", "Monday", "11:00"));
    }

    #[test]
    fn test_recommit_after_fulfillment_creates_fresh_entry() {
        let mut ledger = CommitmentLedger::new();
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 2, 1)
            .unwrap();
        assert!(ledger.fulfill("C1", "C2", "Monday", "11:00"));
        ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 4, 2)
            .unwrap();
        assert_eq!(ledger.total_count(), 2);
        assert_eq!(
            ledger.pending_for("C1", "Monday", "11:00"),
            vec![("C2".to_string(), 4)]
        );
    }
}
