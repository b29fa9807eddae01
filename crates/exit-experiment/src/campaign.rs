//! Campaign driver: weeks x days x slots over the timetable.
//!
//! The driver owns the single long-lived `CampaignState` and runs one session
//! per timetable cell in declared order. Sessions are isolated: a degenerate
//! cell is logged and surfaced in its summary, never fatal to the campaign.

use tracing::{info, warn};

use bottleneck_kernel::CampaignState;

use crate::judge::DecisionJudge;
use crate::oracle::DialogueOracle;
use crate::results::CampaignReport;
use crate::session::{SessionConfig, SessionScheduler};
use crate::timetable::Timetable;

pub struct CampaignDriver {
    timetable: Timetable,
    session_config: SessionConfig,
    seed: u64,
}

impl CampaignDriver {
    pub fn new(timetable: Timetable, session_config: SessionConfig, seed: u64) -> Self {
        Self {
            timetable,
            session_config,
            seed,
        }
    }

    /// Run the full campaign and assemble the report.
    pub async fn run(
        &self,
        judge: &mut dyn DecisionJudge,
        oracle: &dyn DialogueOracle,
    ) -> CampaignReport {
        let mut campaign = CampaignState::new(
            self.timetable.roster(),
            self.timetable.bottleneck_capacity,
        );
        let mut sessions = Vec::with_capacity(
            self.timetable.weeks as usize * self.timetable.cells_per_week(),
        );

        info!(
            weeks = self.timetable.weeks,
            classrooms = self.timetable.classrooms.len(),
            capacity = self.timetable.bottleneck_capacity,
            seed = self.seed,
            "campaign start"
        );

        for week in 1..=self.timetable.weeks {
            campaign.week = week;
            for day in &self.timetable.days {
                for slot in &day.slots {
                    let agents = self.timetable.agents_in_slot(slot);
                    let mut scheduler = SessionScheduler::new(
                        &day.name,
                        &slot.label,
                        agents,
                        self.session_config.clone(),
                    );
                    let summary = scheduler.run(&mut campaign, judge, oracle).await;
                    if summary.degenerate {
                        warn!(
                            week,
                            day = %day.name,
                            slot = %slot.label,
                            "degenerate session"
                        );
                    }
                    sessions.push(summary);
                }
            }
        }

        info!(
            sessions = sessions.len(),
            commitments = campaign.ledger.total_count(),
            fulfilled = campaign.ledger.fulfilled_count(),
            violations = campaign.scores.total_violations(),
            "campaign complete"
        );
        CampaignReport::build(&campaign, sessions, self.seed, self.timetable.weeks)
    }
}
