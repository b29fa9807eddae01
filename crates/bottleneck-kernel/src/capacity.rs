//! Bottleneck capacity model.
//!
//! Tracks the corridor's effective throughput and derives congestion severity
//! from the projected load of a session. The model is deliberately
//! memoryless: the effective value is recomputed fresh from each session's
//! projected load, once, before negotiation begins.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;

/// Fraction of baseline throughput lost when the corridor is overloaded.
const OVERLOAD_PENALTY: f64 = 0.20;

/// Congestion severity derived from projected load vs. baseline capacity.
///
/// Ordering is meaningful: `Normal < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CongestionTier {
    /// Load fits within baseline capacity.
    Normal,
    /// Load up to 1.5x baseline; exits need to spread out.
    High,
    /// Load beyond 1.5x baseline; multiple staggered batches required.
    Critical,
}

impl std::fmt::Display for CongestionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Current bottleneck throughput state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityModel {
    /// Nominal throughput (students per minute) with no congestion.
    baseline: u32,
    /// Floor for the degraded throughput.
    minimum: u32,
    /// Effective throughput after the last `update`.
    effective: u32,
}

impl CapacityModel {
    /// Create a model with the given baseline throughput.
    ///
    /// The degradation floor defaults to half the baseline.
    pub fn new(baseline: u32) -> Self {
        Self {
            baseline,
            minimum: baseline / 2,
            effective: baseline,
        }
    }

    /// Sum the attendance of the active classroom agents.
    pub fn project_load<'a>(active: impl IntoIterator<Item = &'a Agent>) -> u32 {
        active
            .into_iter()
            .filter(|a| a.is_classroom())
            .map(|a| a.attendance)
            .sum()
    }

    /// Recompute effective throughput from this session's projected load.
    ///
    /// Overload degrades throughput by a fixed penalty, floored at the
    /// minimum; otherwise the effective value resets to baseline. Returns the
    /// new effective throughput.
    pub fn update(&mut self, projected_load: u32) -> u32 {
        self.effective = if projected_load > self.baseline {
            let degraded = (self.baseline as f64 * (1.0 - OVERLOAD_PENALTY)).floor() as u32;
            degraded.max(self.minimum)
        } else {
            self.baseline
        };
        self.effective
    }

    /// Congestion tier for a projected load, against baseline capacity.
    pub fn tier(&self, projected_load: u32) -> CongestionTier {
        if projected_load <= self.baseline {
            CongestionTier::Normal
        } else if projected_load as f64 <= self.baseline as f64 * 1.5 {
            CongestionTier::High
        } else {
            CongestionTier::Critical
        }
    }

    /// Number of staggered exit batches required for a projected load.
    pub fn batches_required(&self, projected_load: u32) -> u32 {
        match self.tier(projected_load) {
            CongestionTier::Normal => 1,
            CongestionTier::High => 2,
            CongestionTier::Critical => projected_load.div_ceil(self.baseline),
        }
    }

    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    pub fn effective(&self) -> u32 {
        self.effective
    }
}
