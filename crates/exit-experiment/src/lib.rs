//! Exit Experiment - Negotiated staggered-exit coordination.
//!
//! Several classrooms dismiss into one shared corridor whose throughput is
//! limited. Instead of all exiting on the bell, classroom agents negotiate
//! staggered exit offsets in short sessions refereed by a corridor monitor:
//!
//! - A **decision judge** resolves every turn into a structured intent;
//!   probability tables over a seeded generator make campaigns reproducible.
//! - A **dialogue oracle** (optionally an LLM) narrates the negotiation; its
//!   output never feeds back into state.
//! - Accepted shifts become **commitments** repaid in later weeks, tracked by
//!   the coordination kernel together with rewards, violations, and a
//!   fairness rotation that breaks deadlocks.

pub mod campaign;
pub mod judge;
pub mod oracle;
pub mod results;
pub mod session;
pub mod timetable;

pub use campaign::CampaignDriver;
pub use judge::{DecisionJudge, Disposition, Intent, IntentKind, ProbabilityJudge, ScriptedJudge};
pub use oracle::{ChatOracle, DialogueOracle, ScriptedOracle, SilentOracle, Utterance};
pub use results::{CampaignReport, CampaignTotals};
pub use session::{SessionConfig, SessionScheduler, SessionSummary, ShiftRecord};
pub use timetable::Timetable;
