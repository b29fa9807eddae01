//! Campaign reporting: JSON report files and the console summary.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use bottleneck_kernel::{AgentId, CampaignState};

use crate::session::SessionSummary;

/// Aggregate totals across a campaign.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignTotals {
    pub sessions_run: usize,
    pub total_commitments: usize,
    pub fulfilled_commitments: usize,
    /// Fulfilled / total; absent when no commitments were ever made.
    pub fulfillment_rate: Option<f64>,
    pub refusals: u32,
    pub skipped_turns: u32,
    pub forced_selections: u32,
    pub violations_by_agent: BTreeMap<AgentId, u32>,
    pub rewards_by_agent: BTreeMap<AgentId, i64>,
}

/// Full record of one campaign run.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub weeks: u32,
    pub baseline_capacity: u32,
    pub final_effective_capacity: u32,
    pub totals: CampaignTotals,
    pub sessions: Vec<SessionSummary>,
}

impl CampaignReport {
    /// Assemble the report from the finished campaign state and the
    /// per-session summaries.
    pub fn build(
        campaign: &CampaignState,
        sessions: Vec<SessionSummary>,
        seed: u64,
        weeks: u32,
    ) -> Self {
        let total_commitments = campaign.ledger.total_count();
        let fulfilled_commitments = campaign.ledger.fulfilled_count();
        let fulfillment_rate = if total_commitments == 0 {
            None
        } else {
            Some(fulfilled_commitments as f64 / total_commitments as f64)
        };
        let totals = CampaignTotals {
            sessions_run: sessions.len(),
            total_commitments,
            fulfilled_commitments,
            fulfillment_rate,
            refusals: sessions.iter().map(|s| s.refusals).sum(),
            skipped_turns: sessions.iter().map(|s| s.skipped_turns).sum(),
            forced_selections: sessions
                .iter()
                .filter(|s| s.forced_agent.is_some())
                .count() as u32,
            violations_by_agent: campaign.scores.per_agent_violations(),
            rewards_by_agent: campaign.scores.per_agent_rewards(),
        };
        Self {
            generated_at: Utc::now(),
            seed,
            weeks,
            baseline_capacity: campaign.capacity.baseline(),
            final_effective_capacity: campaign.capacity.effective(),
            totals,
            sessions,
        }
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing campaign report")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report {}", path.display()))?;
        Ok(())
    }

    /// Render the end-of-campaign console summary.
    pub fn render_console(&self) -> String {
        let mut out = String::new();
        out.push_str("=== CAMPAIGN REPORT ===\n");
        out.push_str(&format!(
            "weeks: {}  sessions: {}  seed: {}\n",
            self.weeks, self.totals.sessions_run, self.seed
        ));
        out.push_str(&format!(
            "capacity: baseline {}/min, final effective {}/min\n",
            self.baseline_capacity, self.final_effective_capacity
        ));
        match self.totals.fulfillment_rate {
            Some(rate) => out.push_str(&format!(
                "commitments: {} made, {} fulfilled ({:.0}%)\n",
                self.totals.total_commitments,
                self.totals.fulfilled_commitments,
                rate * 100.0
            )),
            None => out.push_str("commitments: none made\n"),
        }
        out.push_str(&format!(
            "refusals: {}  forced selections: {}  skipped turns: {}\n",
            self.totals.refusals, self.totals.forced_selections, self.totals.skipped_turns
        ));
        if !self.totals.rewards_by_agent.is_empty() {
            out.push_str("per-agent standing:\n");
            for (agent, reward) in &self.totals.rewards_by_agent {
                let violations = self
                    .totals
                    .violations_by_agent
                    .get(agent)
                    .copied()
                    .unwrap_or(0);
                out.push_str(&format!(
                    "  {agent}: reward {reward}, violations {violations}\n"
                ));
            }
        }
        for session in &self.sessions {
            let forced = session
                .forced_agent
                .as_deref()
                .map(|a| format!(", forced {a}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  week {} {} {}: load {} tier {} shifts {}{}\n",
                session.week,
                session.day,
                session.slot,
                session.projected_load,
                session.tier,
                session.shifts.len(),
                forced
            ));
        }
        out
    }
}
