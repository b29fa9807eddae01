//! Error taxonomy for the coordination kernel.

use thiserror::Error;

/// Errors raised by kernel state operations.
///
/// These are rejections, not retryable conditions: an `InvalidCommitment` is
/// a malformed ledger request and `NoEligibleAgent` means the fairness queues
/// hold no agent that could be forced to yield (degenerate session).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinationError {
    /// Malformed ledger request: self-commitment or zero minutes.
    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    /// Both fairness queues are exhausted for the session's roster.
    #[error("no eligible agent in fairness queues")]
    NoEligibleAgent,
}
