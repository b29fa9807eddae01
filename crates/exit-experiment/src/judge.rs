//! Decision judge: the single source of truth for negotiation outcomes.
//!
//! The dialogue oracle produces narrative only; every state mutation is
//! driven by the structured `Intent` a judge returns for a turn. The
//! reference `ProbabilityJudge` implements fixed probability tables over a
//! seeded generator so campaigns are reproducible from one seed; tests and
//! alternative policies can substitute anything satisfying `DecisionJudge`.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use bottleneck_kernel::AgentId;

/// Staggered exit slots offered during negotiation (minutes from scheduled
/// end). Zero is the on-time default, not a negotiable offset.
pub const STAGGER_OFFSETS: [i32; 4] = [-4, -2, 2, 4];

/// Reward score above which an agent negotiates from a strong position.
const REWARD_CUTOFF: i64 = 5;

/// Refusal probability for high-reward agents.
const REFUSE_HIGH_REWARD: f64 = 0.20;
/// Refusal probability otherwise.
const REFUSE_LOW_REWARD: f64 = 0.50;
/// Acceptance probability for high-reward agents.
const ACCEPT_HIGH_REWARD: f64 = 0.80;
/// Acceptance probability otherwise.
const ACCEPT_LOW_REWARD: f64 = 0.50;
/// Probability of fulfilling a debt once the professor consults favorably.
const FULFILL_IF_FAVORABLE: f64 = 0.75;
/// Probability a non-refusing agent floats a proposal (vs. staying on time).
const PROPOSE_RATE: f64 = 0.50;

/// What kind of action a turn resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Float a staggered-exit proposal to the table.
    Propose,
    /// Accept the proposal currently on the table.
    Accept,
    /// Refuse the request or proposal at hand.
    Refuse,
    /// Honor a pending commitment.
    Fulfill,
    /// Keep the scheduled (zero-offset) exit time.
    OnTime,
}

/// Structured outcome of one decision point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    /// Proposed exit offset in minutes; meaningful for `Propose` only.
    pub offset_minutes: i32,
    /// Intended counterparty, when the policy names one.
    pub target: Option<AgentId>,
}

impl Intent {
    pub fn propose(offset_minutes: i32) -> Self {
        Self {
            kind: IntentKind::Propose,
            offset_minutes,
            target: None,
        }
    }

    pub fn accept() -> Self {
        Self {
            kind: IntentKind::Accept,
            offset_minutes: 0,
            target: None,
        }
    }

    pub fn refuse() -> Self {
        Self {
            kind: IntentKind::Refuse,
            offset_minutes: 0,
            target: None,
        }
    }

    pub fn fulfill() -> Self {
        Self {
            kind: IntentKind::Fulfill,
            offset_minutes: 0,
            target: None,
        }
    }

    pub fn on_time() -> Self {
        Self {
            kind: IntentKind::OnTime,
            offset_minutes: 0,
            target: None,
        }
    }
}

/// Whether the session's projected load exceeds bottleneck capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Normal,
    Congested,
}

/// The decision being asked of the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPoint {
    /// A negotiation turn; `proposal_open` is true when another agent's
    /// proposal is on the table.
    Negotiation { proposal_open: bool },
    /// End-of-session resolution of a pending commitment.
    Fulfillment,
}

/// Read-only view of an agent's standing at decision time.
#[derive(Debug, Clone, Copy)]
pub struct ScoreSnapshot {
    pub reward: i64,
    pub violations: u32,
    pub has_pending_debt: bool,
}

/// Resolves a turn's decision point into a structured intent.
pub trait DecisionJudge {
    fn resolve(
        &mut self,
        agent: &str,
        point: DecisionPoint,
        snapshot: &ScoreSnapshot,
        mode: SessionMode,
    ) -> Intent;
}

/// Professor disposition categories, each with a fixed probability of
/// consulting favorably on a time adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Flexible,
    Strict,
    TimeConscious,
}

impl Disposition {
    pub fn favorable_probability(self) -> f64 {
        match self {
            Self::Flexible => 0.80,
            Self::Strict => 0.40,
            Self::TimeConscious => 0.30,
        }
    }
}

/// Reference judge implementing the fixed probability tables.
///
/// All sampling flows through one seeded `StdRng`, so a campaign's every
/// decision is reproducible from the seed. Each agent is assigned a professor
/// disposition the first time it is seen.
pub struct ProbabilityJudge {
    rng: StdRng,
    dispositions: HashMap<AgentId, Disposition>,
}

impl ProbabilityJudge {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dispositions: HashMap::new(),
        }
    }

    /// Pin an agent's disposition instead of sampling it.
    pub fn with_disposition(mut self, agent: impl Into<AgentId>, disposition: Disposition) -> Self {
        self.dispositions.insert(agent.into(), disposition);
        self
    }

    fn disposition_for(&mut self, agent: &str) -> Disposition {
        if let Some(d) = self.dispositions.get(agent) {
            return *d;
        }
        let drawn = *[
            Disposition::Flexible,
            Disposition::Strict,
            Disposition::TimeConscious,
        ]
        .choose(&mut self.rng)
        .expect("non-empty");
        self.dispositions.insert(agent.to_string(), drawn);
        drawn
    }

    /// Debt resolution: a favorable professor consult gates fulfillment.
    fn fulfillment_intent(&mut self, agent: &str) -> Intent {
        let favorable_p = self.disposition_for(agent).favorable_probability();
        let favorable = self.rng.random::<f64>() < favorable_p;
        if favorable && self.rng.random::<f64>() < FULFILL_IF_FAVORABLE {
            Intent::fulfill()
        } else {
            Intent::refuse()
        }
    }
}

impl DecisionJudge for ProbabilityJudge {
    fn resolve(
        &mut self,
        agent: &str,
        point: DecisionPoint,
        snapshot: &ScoreSnapshot,
        _mode: SessionMode,
    ) -> Intent {
        match point {
            DecisionPoint::Fulfillment => self.fulfillment_intent(agent),
            DecisionPoint::Negotiation { proposal_open: true } => {
                let accept_p = if snapshot.reward > REWARD_CUTOFF {
                    ACCEPT_HIGH_REWARD
                } else {
                    ACCEPT_LOW_REWARD
                };
                if self.rng.random::<f64>() < accept_p {
                    Intent::accept()
                } else {
                    Intent::refuse()
                }
            }
            DecisionPoint::Negotiation {
                proposal_open: false,
            } => {
                let refuse_p = if snapshot.reward > REWARD_CUTOFF {
                    REFUSE_HIGH_REWARD
                } else {
                    REFUSE_LOW_REWARD
                };
                if self.rng.random::<f64>() < refuse_p {
                    Intent::refuse()
                } else if self.rng.random::<f64>() < PROPOSE_RATE {
                    let offset = *STAGGER_OFFSETS.choose(&mut self.rng).expect("non-empty");
                    Intent::propose(offset)
                } else {
                    Intent::on_time()
                }
            }
        }
    }
}

/// Deterministic judge that replays a fixed script, then a fallback intent.
///
/// Used by tests and offline demonstrations where sampled outcomes would get
/// in the way.
pub struct ScriptedJudge {
    script: VecDeque<Intent>,
    fallback: Intent,
}

impl ScriptedJudge {
    /// Always resolve to the same intent.
    pub fn always(intent: Intent) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: intent,
        }
    }

    /// Resolve the scripted intents in order, then fall back.
    pub fn with_script(script: Vec<Intent>, fallback: Intent) -> Self {
        Self {
            script: script.into(),
            fallback,
        }
    }
}

impl DecisionJudge for ScriptedJudge {
    fn resolve(
        &mut self,
        _agent: &str,
        _point: DecisionPoint,
        _snapshot: &ScoreSnapshot,
        _mode: SessionMode,
    ) -> Intent {
        self.script.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(reward: i64) -> ScoreSnapshot {
        ScoreSnapshot {
            reward,
            violations: 0,
            has_pending_debt: false,
        }
    }

    fn refusal_rate(judge: &mut ProbabilityJudge, reward: i64, trials: usize) -> f64 {
        let mut refused = 0usize;
        for _ in 0..trials {
            let intent = judge.resolve(
                "C1",
                DecisionPoint::Negotiation {
                    proposal_open: false,
                },
                &snapshot(reward),
                SessionMode::Normal,
            );
            if intent.kind == IntentKind::Refuse {
                refused += 1;
            }
        }
        refused as f64 / trials as f64
    }

    #[test]
    fn test_high_reward_refusal_rate() {
        let mut judge = ProbabilityJudge::new(7);
        let rate = refusal_rate(&mut judge, 6, 10_000);
        assert!((rate - 0.20).abs() < 0.03, "refusal rate {rate}");
    }

    #[test]
    fn test_low_reward_refusal_rate() {
        let mut judge = ProbabilityJudge::new(11);
        let rate = refusal_rate(&mut judge, 0, 10_000);
        assert!((rate - 0.50).abs() < 0.03, "refusal rate {rate}");
    }

    #[test]
    fn test_high_reward_acceptance_rate() {
        let mut judge = ProbabilityJudge::new(13);
        let mut accepted = 0usize;
        let trials = 10_000;
        for _ in 0..trials {
            let intent = judge.resolve(
                "C2",
                DecisionPoint::Negotiation {
                    proposal_open: true,
                },
                &snapshot(6),
                SessionMode::Congested,
            );
            if intent.kind == IntentKind::Accept {
                accepted += 1;
            }
        }
        let rate = accepted as f64 / trials as f64;
        assert!((rate - 0.80).abs() < 0.03, "acceptance rate {rate}");
    }

    #[test]
    fn test_fulfillment_rate_for_flexible_disposition() {
        // A flexible professor fulfills at 0.8 * 0.75 = 0.6.
        let mut judge =
            ProbabilityJudge::new(17).with_disposition("C1", Disposition::Flexible);
        let snap = ScoreSnapshot {
            reward: 6,
            violations: 0,
            has_pending_debt: true,
        };
        let trials = 10_000;
        let mut fulfilled = 0usize;
        for _ in 0..trials {
            let intent = judge.resolve("C1", DecisionPoint::Fulfillment, &snap, SessionMode::Normal);
            // The fulfillment path never floats new terms.
            assert!(matches!(
                intent.kind,
                IntentKind::Fulfill | IntentKind::Refuse
            ));
            if intent.kind == IntentKind::Fulfill {
                fulfilled += 1;
            }
        }
        let rate = fulfilled as f64 / trials as f64;
        assert!((rate - 0.60).abs() < 0.03, "fulfillment rate {rate}");
    }

    #[test]
    fn test_proposed_offsets_are_nonzero_slots() {
        let mut judge = ProbabilityJudge::new(19);
        for _ in 0..2_000 {
            let intent = judge.resolve(
                "C3",
                DecisionPoint::Negotiation {
                    proposal_open: false,
                },
                &snapshot(6),
                SessionMode::Normal,
            );
            if intent.kind == IntentKind::Propose {
                assert!(STAGGER_OFFSETS.contains(&intent.offset_minutes));
                assert_ne!(intent.offset_minutes, 0);
            }
        }
    }

    #[test]
    fn test_seeded_judge_is_reproducible() {
        let run = |seed| {
            let mut judge = ProbabilityJudge::new(seed);
            (0..50)
                .map(|_| {
                    judge
                        .resolve(
                            "C1",
                            DecisionPoint::Negotiation {
                                proposal_open: false,
                            },
                            &snapshot(0),
                            SessionMode::Normal,
                        )
                        .kind
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_scripted_judge_replays_then_falls_back() {
        let mut judge = ScriptedJudge::with_script(
            vec![Intent::propose(-2), Intent::accept()],
            Intent::refuse(),
        );
        let snap = snapshot(0);
        let point = DecisionPoint::Negotiation {
            proposal_open: false,
        };
        assert_eq!(
            judge.resolve("C1", point, &snap, SessionMode::Normal).kind,
            IntentKind::Propose
        );
        assert_eq!(
            judge.resolve("C2", point, &snap, SessionMode::Normal).kind,
            IntentKind::Accept
        );
        assert_eq!(
            judge.resolve("C3", point, &snap, SessionMode::Normal).kind,
            IntentKind::Refuse
        );
    }
}
