//! Session scheduler: the per-cell negotiation turn engine.
//!
//! One scheduler instance runs one timetable cell (day, slot) through the
//! phase sequence Start, MonitorReport, Negotiate, FulfillCheck, Summary.
//! The scheduler owns nothing long-lived: campaign state arrives by mutable
//! reference and every mutation happens synchronously in turn order. The
//! dialogue oracle is the only await point, and its output never feeds back
//! into state.

use serde::Serialize;
use tracing::{debug, info, warn};

use bottleneck_kernel::{
    Agent, AgentId, CampaignState, CapacityModel, CongestionTier, RewardEvent,
};

use crate::judge::{DecisionJudge, DecisionPoint, Intent, IntentKind, ScoreSnapshot, SessionMode};
use crate::oracle::{DialogueOracle, Utterance};

/// Tunables for one session run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Negotiation turn budget.
    pub max_turns: u32,
    /// Every Nth turn returns the floor to the monitor for a status refresh.
    pub monitor_refresh_interval: u32,
    /// Extra oracle attempts per turn before the turn is skipped.
    pub oracle_retries: u32,
    /// Exit offset assigned to a forced yielder.
    pub forced_offset: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 12,
            monitor_refresh_interval: 5,
            oracle_retries: 0,
            forced_offset: -2,
        }
    }
}

/// Phases a session passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Start,
    MonitorReport,
    Negotiate,
    FulfillCheck,
    Summary,
    Done,
}

/// One agent's resolved exit shift for this cell.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftRecord {
    pub agent: AgentId,
    pub offset_minutes: i32,
    /// True when the fairness rotation imposed the shift.
    pub forced: bool,
}

/// Record of a completed session, emitted in the Summary phase.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub week: u32,
    pub day: String,
    pub slot: String,
    pub active_agents: Vec<AgentId>,
    pub projected_load: u32,
    pub effective_capacity: u32,
    pub tier: CongestionTier,
    pub batches_required: u32,
    pub congested: bool,
    pub turns_taken: u32,
    pub skipped_turns: u32,
    pub shifts: Vec<ShiftRecord>,
    pub commitments_made: u32,
    pub commitments_fulfilled: u32,
    pub refusals: u32,
    /// Unfulfilled ledger entries campaign-wide when the session closed.
    pub active_commitments: usize,
    /// Cumulative violation count campaign-wide when the session closed.
    pub violations_total: u32,
    /// Agents whose violation count crossed the escalation threshold here.
    pub escalations: Vec<AgentId>,
    pub forced_agent: Option<AgentId>,
    /// Set when the cell could not negotiate meaningfully (single agent,
    /// or forced selection found no eligible agent).
    pub degenerate: bool,
    pub transcript: Vec<Utterance>,
}

/// A staggered-exit proposal currently on the table.
#[derive(Debug, Clone)]
struct OpenProposal {
    proposer: AgentId,
    offset_minutes: i32,
}

/// Role prompts fed to the dialogue oracle. Narration flavor only.
pub struct PromptTemplates;

impl PromptTemplates {
    pub fn monitor(
        day: &str,
        slot: &str,
        projected_load: u32,
        effective_capacity: u32,
        tier: CongestionTier,
        batches: u32,
    ) -> String {
        format!(
            "You are the corridor monitor for the {day} {slot} dismissal. \
             Projected load is {projected_load} students against an effective \
             capacity of {effective_capacity} per minute (tier {tier}). \
             {batches} staggered batch(es) at 2-minute spacing are required. \
             Broadcast a brief status report to the classrooms."
        )
    }

    pub fn classroom(
        agent: &str,
        day: &str,
        slot: &str,
        tier: CongestionTier,
        reward: i64,
        violations: u32,
        pending: &[(AgentId, i32)],
    ) -> String {
        let debt = if pending.is_empty() {
            "You have no pending commitments for this slot.".to_string()
        } else {
            let owed: Vec<String> = pending
                .iter()
                .map(|(creditor, minutes)| format!("{minutes:+} min to {creditor}"))
                .collect();
            format!(
                "You owe pending commitments for this slot: {}. Honor them \
                 before negotiating new terms.",
                owed.join(", ")
            )
        };
        format!(
            "You are classroom {agent} negotiating your {day} {slot} exit time. \
             Corridor congestion is {tier}. Your reward score is {reward} and \
             you have {violations} violation(s). {debt} You may propose a \
             staggered exit offset, accept or refuse the current proposal, or \
             keep your scheduled time. Accepted shifts are repaid in a later \
             week. Speak one short in-character turn."
        )
    }
}

/// Classroom roster index speaking on a 1-based turn, or `None` for the
/// monitor's periodic status refresh.
///
/// A pure function of the turn number, so turn order is reproducible and no
/// classroom speaks twice in a row unless it is the sole active agent.
pub(crate) fn speaker_index(turn: u32, refresh_interval: u32, roster_len: usize) -> Option<usize> {
    if roster_len == 0 {
        return None;
    }
    if refresh_interval > 0 && turn.is_multiple_of(refresh_interval) {
        return None;
    }
    let monitor_turns_before = if refresh_interval > 0 {
        (turn - 1) / refresh_interval
    } else {
        0
    };
    Some(((turn - 1 - monitor_turns_before) as usize) % roster_len)
}

/// Turn engine for a single timetable cell.
pub struct SessionScheduler {
    day: String,
    slot: String,
    /// Active classrooms for this cell, in roster order.
    agents: Vec<Agent>,
    monitor: Agent,
    config: SessionConfig,
    phase: SessionPhase,
}

impl SessionScheduler {
    pub fn new(day: &str, slot: &str, agents: Vec<Agent>, config: SessionConfig) -> Self {
        Self {
            day: day.to_string(),
            slot: slot.to_string(),
            agents,
            monitor: Agent::monitor("B"),
            config,
            phase: SessionPhase::Start,
        }
    }

    fn enter(&mut self, phase: SessionPhase) {
        debug!(day = %self.day, slot = %self.slot, ?phase, "session phase");
        self.phase = phase;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Narrate one turn, tolerating oracle failure within the retry budget.
    async fn narrate(
        &self,
        oracle: &dyn DialogueOracle,
        prompt: &str,
        transcript: &[Utterance],
    ) -> Option<String> {
        for attempt in 0..=self.config.oracle_retries {
            match oracle.generate(prompt, transcript).await {
                Ok(text) => return Some(text),
                Err(err) => {
                    warn!(%err, attempt, "oracle call failed");
                }
            }
        }
        None
    }

    /// Run the session to completion. Never fails: internal trouble is
    /// logged, reflected in the summary, and isolated from the campaign.
    pub async fn run(
        &mut self,
        campaign: &mut CampaignState,
        judge: &mut dyn DecisionJudge,
        oracle: &dyn DialogueOracle,
    ) -> SessionSummary {
        // Start: project load and refresh the capacity model.
        let active: Vec<AgentId> = self.agents.iter().map(|a| a.name.clone()).collect();
        let projected_load = CapacityModel::project_load(&self.agents);
        let effective_capacity = campaign.capacity.update(projected_load);
        let tier = campaign.capacity.tier(projected_load);
        let batches_required = campaign.capacity.batches_required(projected_load);
        let congested = projected_load > campaign.capacity.baseline();
        let mode = if congested {
            SessionMode::Congested
        } else {
            SessionMode::Normal
        };

        info!(
            week = campaign.week,
            day = %self.day,
            slot = %self.slot,
            projected_load,
            effective_capacity,
            %tier,
            batches_required,
            "session start"
        );

        let mut transcript: Vec<Utterance> = Vec::new();
        let mut shifts: Vec<ShiftRecord> = Vec::new();
        let mut escalations: Vec<AgentId> = Vec::new();
        let mut open_proposal: Option<OpenProposal> = None;
        let mut skipped_turns = 0u32;
        let mut commitments_made = 0u32;
        let mut commitments_fulfilled = 0u32;
        let mut refusals = 0u32;
        let mut degenerate = self.agents.len() < 2;
        let mut forced_agent = None;

        // MonitorReport: opening status broadcast.
        self.enter(SessionPhase::MonitorReport);
        self.monitor_broadcast(
            oracle,
            &mut transcript,
            projected_load,
            effective_capacity,
            tier,
            batches_required,
        )
        .await;

        // Negotiate: bounded turn loop.
        self.enter(SessionPhase::Negotiate);
        let mut turns_taken = 0u32;
        for turn in 1..=self.config.max_turns {
            turns_taken = turn;
            let Some(idx) =
                speaker_index(turn, self.config.monitor_refresh_interval, self.agents.len())
            else {
                self.monitor_broadcast(
                    oracle,
                    &mut transcript,
                    projected_load,
                    effective_capacity,
                    tier,
                    batches_required,
                )
                .await;
                continue;
            };
            let speaker = self.agents[idx].name.clone();

            let pending = campaign
                .ledger
                .due_for(&speaker, &self.day, &self.slot, campaign.week);
            let prompt = PromptTemplates::classroom(
                &speaker,
                &self.day,
                &self.slot,
                tier,
                campaign.scores.reward(&speaker),
                campaign.scores.violation_count(&speaker),
                &pending,
            );
            match self.narrate(oracle, &prompt, &transcript).await {
                Some(text) => {
                    if !text.is_empty() {
                        transcript.push(Utterance {
                            speaker: speaker.clone(),
                            text,
                        });
                    }
                }
                None => {
                    // Implicit refusal: the turn is skipped with no mutation.
                    warn!(agent = %speaker, turn, "turn skipped, oracle exhausted");
                    skipped_turns += 1;
                    continue;
                }
            }

            // The proposer cannot answer its own proposal; it gets a fresh
            // negotiation turn and may restate terms.
            let proposal_open = open_proposal
                .as_ref()
                .is_some_and(|p| p.proposer != speaker);
            let snapshot = ScoreSnapshot {
                reward: campaign.scores.reward(&speaker),
                violations: campaign.scores.violation_count(&speaker),
                has_pending_debt: !pending.is_empty(),
            };
            // Debt gates the turn regardless of judge policy: a debtor's
            // decision point is fulfillment, and anything short of fulfilling
            // counts as a refusal. New terms are only reachable debt-free.
            let intent = if pending.is_empty() {
                judge.resolve(
                    &speaker,
                    DecisionPoint::Negotiation { proposal_open },
                    &snapshot,
                    mode,
                )
            } else {
                let debt_intent =
                    judge.resolve(&speaker, DecisionPoint::Fulfillment, &snapshot, mode);
                if debt_intent.kind == IntentKind::Fulfill {
                    debt_intent
                } else {
                    Intent::refuse()
                }
            };
            self.apply_intent(
                campaign,
                &speaker,
                intent,
                mode,
                &mut open_proposal,
                &mut shifts,
                &mut escalations,
                &mut commitments_made,
                &mut commitments_fulfilled,
                &mut refusals,
            );
        }

        // FulfillCheck: resolve obligations still pending for this cell.
        self.enter(SessionPhase::FulfillCheck);
        for agent in &active {
            for (creditor, minutes) in
                campaign.ledger.due_for(agent, &self.day, &self.slot, campaign.week)
            {
                let snapshot = ScoreSnapshot {
                    reward: campaign.scores.reward(agent),
                    violations: campaign.scores.violation_count(agent),
                    has_pending_debt: true,
                };
                let intent = judge.resolve(agent, DecisionPoint::Fulfillment, &snapshot, mode);
                if intent.kind == IntentKind::Fulfill
                    && campaign.ledger.fulfill(agent, &creditor, &self.day, &self.slot)
                {
                    campaign.scores.apply(agent, RewardEvent::HonoredCommitment);
                    commitments_fulfilled += 1;
                    shifts.push(ShiftRecord {
                        agent: agent.clone(),
                        offset_minutes: minutes,
                        forced: false,
                    });
                    info!(agent, creditor = %creditor, minutes, "commitment honored");
                } else {
                    campaign.scores.apply(agent, RewardEvent::RefusedRequest);
                    refusals += 1;
                    if campaign.scores.record_violation(agent) {
                        escalations.push(agent.clone());
                    }
                    info!(agent, creditor = %creditor, "commitment unhonored");
                }
            }
        }

        // Escape valve: persistent congestion with no shifted exit forces one
        // agent onto the earliest early slot via the fairness rotation.
        if congested && !shifts.iter().any(|s| s.offset_minutes != 0) {
            match campaign.queues.select_forced_agent(&active) {
                Ok(agent) => {
                    campaign.scores.apply(&agent, RewardEvent::EarlyExitAccepted);
                    shifts.push(ShiftRecord {
                        agent: agent.clone(),
                        offset_minutes: self.config.forced_offset,
                        forced: true,
                    });
                    info!(
                        %agent,
                        offset = self.config.forced_offset,
                        "deadlock broken by forced selection"
                    );
                    forced_agent = Some(agent);
                }
                Err(err) => {
                    warn!(%err, "no agent eligible for forced selection");
                    degenerate = true;
                }
            }
        }

        self.enter(SessionPhase::Summary);
        let summary = SessionSummary {
            week: campaign.week,
            day: self.day.clone(),
            slot: self.slot.clone(),
            active_agents: active,
            projected_load,
            effective_capacity,
            tier,
            batches_required,
            congested,
            turns_taken,
            skipped_turns,
            shifts,
            commitments_made,
            commitments_fulfilled,
            refusals,
            active_commitments: campaign.ledger.active_count(),
            violations_total: campaign.scores.total_violations(),
            escalations,
            forced_agent,
            degenerate,
            transcript,
        };
        info!(
            day = %summary.day,
            slot = %summary.slot,
            commitments_made = summary.commitments_made,
            commitments_fulfilled = summary.commitments_fulfilled,
            refusals = summary.refusals,
            shifts = summary.shifts.len(),
            "session complete"
        );
        self.enter(SessionPhase::Done);
        summary
    }

    async fn monitor_broadcast(
        &self,
        oracle: &dyn DialogueOracle,
        transcript: &mut Vec<Utterance>,
        projected_load: u32,
        effective_capacity: u32,
        tier: CongestionTier,
        batches: u32,
    ) {
        let status = format!(
            "BOTTLENECK STATUS: load {projected_load}, capacity \
             {effective_capacity}/min, tier {tier}, {batches} batch(es)"
        );
        let prompt = PromptTemplates::monitor(
            &self.day,
            &self.slot,
            projected_load,
            effective_capacity,
            tier,
            batches,
        );
        let text = match self.narrate(oracle, &prompt, transcript).await {
            Some(text) if !text.is_empty() => text,
            _ => status,
        };
        transcript.push(Utterance {
            speaker: self.monitor.name.clone(),
            text,
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_intent(
        &self,
        campaign: &mut CampaignState,
        speaker: &str,
        intent: Intent,
        mode: SessionMode,
        open_proposal: &mut Option<OpenProposal>,
        shifts: &mut Vec<ShiftRecord>,
        escalations: &mut Vec<AgentId>,
        commitments_made: &mut u32,
        commitments_fulfilled: &mut u32,
        refusals: &mut u32,
    ) {
        match intent.kind {
            IntentKind::Propose => {
                info!(agent = speaker, offset = intent.offset_minutes, "proposal floated");
                *open_proposal = Some(OpenProposal {
                    proposer: speaker.to_string(),
                    offset_minutes: intent.offset_minutes,
                });
            }
            IntentKind::Accept => {
                let Some(proposal) = open_proposal.take() else {
                    debug!(agent = speaker, "acceptance with no open proposal ignored");
                    return;
                };
                let offset = proposal.offset_minutes;
                // The accepter takes the shift now; the proposer owes the
                // compensating minutes in the same cell of a later week.
                match campaign.ledger.add_commitment(
                    &proposal.proposer,
                    speaker,
                    &self.day,
                    &self.slot,
                    -offset,
                    campaign.week,
                ) {
                    Ok(()) => {
                        let accept_event = if offset < 0 {
                            RewardEvent::EarlyExitAccepted
                        } else {
                            RewardEvent::LateExitAccepted
                        };
                        campaign.scores.apply(speaker, accept_event);
                        campaign.scores.apply(speaker, RewardEvent::CommitmentCreditor);
                        campaign
                            .scores
                            .apply(&proposal.proposer, RewardEvent::CommitmentDebtor);
                        campaign.queues.record_commitment_made(&proposal.proposer);
                        *commitments_made += 1;
                        shifts.push(ShiftRecord {
                            agent: speaker.to_string(),
                            offset_minutes: offset,
                            forced: false,
                        });
                        info!(
                            accepter = speaker,
                            proposer = %proposal.proposer,
                            offset,
                            "proposal accepted"
                        );
                    }
                    Err(err) => {
                        warn!(%err, accepter = speaker, "acceptance produced no commitment");
                    }
                }
            }
            IntentKind::Refuse => {
                campaign.scores.apply(speaker, RewardEvent::RefusedRequest);
                *refusals += 1;
                if campaign.scores.record_violation(speaker) {
                    escalations.push(speaker.to_string());
                }
                debug!(agent = speaker, "refused");
            }
            IntentKind::Fulfill => {
                for (creditor, minutes) in
                    campaign
                        .ledger
                        .due_for(speaker, &self.day, &self.slot, campaign.week)
                {
                    if campaign.ledger.fulfill(speaker, &creditor, &self.day, &self.slot) {
                        campaign.scores.apply(speaker, RewardEvent::HonoredCommitment);
                        *commitments_fulfilled += 1;
                        shifts.push(ShiftRecord {
                            agent: speaker.to_string(),
                            offset_minutes: minutes,
                            forced: false,
                        });
                        info!(agent = speaker, creditor = %creditor, minutes, "commitment honored");
                    }
                }
            }
            IntentKind::OnTime => {
                if mode == SessionMode::Congested {
                    campaign.scores.apply(speaker, RewardEvent::OnTimeInCongestion);
                }
                shifts.push(ShiftRecord {
                    agent: speaker.to_string(),
                    offset_minutes: 0,
                    forced: false,
                });
                debug!(agent = speaker, "keeping scheduled time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::ScriptedJudge;
    use crate::oracle::{OracleError, SilentOracle};
    use async_trait::async_trait;

    struct FailingOracle;

    #[async_trait]
    impl DialogueOracle for FailingOracle {
        async fn generate(
            &self,
            _role_prompt: &str,
            _conversation: &[Utterance],
        ) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("down".to_string()))
        }
    }

    fn congested_campaign() -> (CampaignState, Vec<Agent>) {
        let roster = vec![
            Agent::classroom("C1", 120),
            Agent::classroom("C2", 80),
            Agent::classroom("C3", 90),
        ];
        let campaign = CampaignState::new(roster.clone(), 100);
        (campaign, roster)
    }

    #[test]
    fn test_speaker_rotation_with_monitor_refresh() {
        // Three classrooms, refresh every 5th turn.
        let order: Vec<Option<usize>> =
            (1..=12).map(|t| speaker_index(t, 5, 3)).collect();
        assert_eq!(
            order,
            vec![
                Some(0),
                Some(1),
                Some(2),
                Some(0),
                None,
                Some(1),
                Some(2),
                Some(0),
                Some(1),
                None,
                Some(2),
                Some(0),
            ]
        );
        // No classroom speaks twice in a row.
        for pair in order.windows(2) {
            if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_sole_agent_keeps_speaking() {
        assert_eq!(speaker_index(1, 5, 1), Some(0));
        assert_eq!(speaker_index(2, 5, 1), Some(0));
        assert_eq!(speaker_index(5, 5, 1), None);
    }

    #[tokio::test]
    async fn test_all_refusals_force_exactly_one_agent() {
        let (mut campaign, roster) = congested_campaign();
        let mut judge = ScriptedJudge::always(Intent::refuse());
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert!(summary.congested);
        assert_eq!(summary.commitments_made, 0);
        assert_eq!(campaign.ledger.total_count(), 0);
        // 12 turns minus monitor refreshes at 5 and 10.
        assert_eq!(summary.refusals, 10);
        assert!(campaign.scores.total_violations() >= 10);
        // Deadlock broken by the fairness queue: first roster agent yields.
        assert_eq!(summary.forced_agent.as_deref(), Some("C1"));
        let forced: Vec<&ShiftRecord> =
            summary.shifts.iter().filter(|s| s.forced).collect();
        assert_eq!(forced.len(), 1);
        assert_eq!(forced[0].offset_minutes, -2);
        assert_eq!(campaign.scores.reward("C1"), {
            // C1 refused 4 turns (-8) then earned the forced early credit (+4).
            -4
        });
    }

    #[tokio::test]
    async fn test_acceptance_creates_mirrored_commitment() {
        let (mut campaign, roster) = congested_campaign();
        // C1 proposes -2; C2 accepts; everyone else stays on time.
        let mut judge = ScriptedJudge::with_script(
            vec![Intent::propose(-2), Intent::accept()],
            Intent::on_time(),
        );
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert_eq!(summary.commitments_made, 1);
        // The accepter shifts now; the proposer owes +2 in a later week.
        assert_eq!(
            campaign.ledger.pending_for("C1", "Monday", "11:00"),
            vec![("C2".to_string(), 2)]
        );
        // C2: early accept +4, creditor +1, then on-time-in-congestion turns.
        assert!(campaign.scores.reward("C2") >= 1);
        // C1 was promoted out of the fresh fairness tier.
        assert!(!campaign.queues.is_never_committed("C1"));
        assert!(summary.shifts.iter().any(|s| {
            s.agent == "C2" && s.offset_minutes == -2 && !s.forced
        }));
        // A nonzero shift exists, so nobody is forced.
        assert!(summary.forced_agent.is_none());
    }

    #[tokio::test]
    async fn test_on_time_in_congestion_penalized() {
        let (mut campaign, roster) = congested_campaign();
        let mut judge = ScriptedJudge::always(Intent::on_time());
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        // Every classroom turn drew the on-time penalty.
        assert!(campaign.scores.reward("C1") < 0);
        assert!(campaign.scores.reward("C2") < 0);
        // All on time still congested: escape valve fires.
        assert_eq!(summary.forced_agent.as_deref(), Some("C1"));
    }

    #[tokio::test]
    async fn test_no_penalty_or_forcing_when_uncongested() {
        let roster = vec![Agent::classroom("C1", 40), Agent::classroom("C2", 50)];
        let mut campaign = CampaignState::new(roster.clone(), 100);
        let mut judge = ScriptedJudge::always(Intent::on_time());
        let mut scheduler =
            SessionScheduler::new("Monday", "10:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert!(!summary.congested);
        assert_eq!(summary.tier, CongestionTier::Normal);
        assert_eq!(campaign.scores.reward("C1"), 0);
        assert!(summary.forced_agent.is_none());
        assert_eq!(scheduler.phase(), SessionPhase::Done);
    }

    #[tokio::test]
    async fn test_pending_debt_fulfilled_in_fulfill_check() {
        let (mut campaign, roster) = congested_campaign();
        campaign
            .ledger
            .add_commitment("C1", "C2", "Monday", "11:00", 2, 1)
            .unwrap();
        // The debt was made in week 1; it comes due the following week.
        campaign.week = 2;
        // Debt holders route to the fulfillment path during negotiation too;
        // a blanket Fulfill script resolves it at the first opportunity.
        let mut judge = ScriptedJudge::always(Intent::fulfill());
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert_eq!(summary.commitments_fulfilled, 1);
        assert_eq!(campaign.ledger.active_count(), 0);
        assert_eq!(campaign.ledger.fulfilled_count(), 1);
        assert_eq!(campaign.scores.reward("C1"), 2);
        // The +2 repayment is a nonzero shift, so no forcing despite congestion.
        assert!(summary.forced_agent.is_none());
    }

    #[tokio::test]
    async fn test_debtor_cannot_open_new_terms_before_debt_is_addressed() {
        let (mut campaign, roster) = congested_campaign();
        campaign
            .ledger
            .add_commitment("C1", "C3", "Monday", "11:00", 2, 1)
            .unwrap();
        campaign.week = 2;
        // A policy that ignores debt outright: C1 tries to float -2 and C2
        // stands ready to accept. The scheduler must not let the proposal
        // through while C1's debt to C3 is due.
        let mut judge = ScriptedJudge::with_script(
            vec![Intent::propose(-2), Intent::accept()],
            Intent::on_time(),
        );
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert_eq!(summary.commitments_made, 0);
        // Only the preexisting debt is on the ledger, still unfulfilled.
        assert_eq!(campaign.ledger.total_count(), 1);
        assert!(!campaign.ledger.pending_for("C1", "Monday", "11:00").is_empty());
        // The non-fulfilling answer counted as a refusal.
        assert!(campaign.scores.violation_count("C1") >= 1);
    }

    #[test]
    fn test_speaker_index_empty_roster() {
        assert_eq!(speaker_index(1, 5, 0), None);
        assert_eq!(speaker_index(5, 5, 0), None);
        assert_eq!(speaker_index(7, 0, 0), None);
    }

    #[tokio::test]
    async fn test_empty_roster_session_completes_degenerate() {
        let mut campaign = CampaignState::new(vec![Agent::classroom("C1", 120)], 100);
        let mut judge = ScriptedJudge::always(Intent::refuse());
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", Vec::new(), SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert!(summary.degenerate);
        assert!(summary.active_agents.is_empty());
        assert_eq!(summary.refusals, 0);
        assert!(summary.forced_agent.is_none());
    }

    #[tokio::test]
    async fn test_oracle_failure_skips_turns_without_mutation() {
        let (mut campaign, roster) = congested_campaign();
        let mut judge = ScriptedJudge::always(Intent::refuse());
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &FailingOracle)
            .await;

        // All 10 classroom turns skipped; refusal scoring never ran.
        assert_eq!(summary.skipped_turns, 10);
        assert_eq!(summary.refusals, 0);
        assert_eq!(campaign.scores.total_violations(), 0);
        assert_eq!(campaign.ledger.total_count(), 0);
        // The session still terminates feasibly via the escape valve.
        assert_eq!(summary.forced_agent.as_deref(), Some("C1"));
        // Monitor broadcasts fall back to the deterministic status line.
        assert!(summary.transcript[0].text.contains("BOTTLENECK STATUS"));
    }

    #[tokio::test]
    async fn test_single_agent_cell_is_degenerate_but_completes() {
        let roster = vec![Agent::classroom("C1", 120)];
        let mut campaign = CampaignState::new(roster.clone(), 100);
        let mut judge = ScriptedJudge::always(Intent::propose(-2));
        let mut scheduler =
            SessionScheduler::new("Monday", "11:00", roster, SessionConfig::default());
        let summary = scheduler
            .run(&mut campaign, &mut judge, &SilentOracle)
            .await;

        assert!(summary.degenerate);
        // Nobody to accept: no commitments, and the lone agent gets forced.
        assert_eq!(summary.commitments_made, 0);
        assert_eq!(summary.forced_agent.as_deref(), Some("C1"));
    }
}
