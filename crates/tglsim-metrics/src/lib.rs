//! TGL Simulator Metrics - how much does the hierarchy save?
//!
//! Everything here is a pure function of finished (or in-progress)
//! [`NetworkState`] snapshots and may be recomputed whenever a caller wants.

use serde::{Deserialize, Serialize};
use tglsim_topology::{NetworkState, Protocol, Termination};

/// Headline numbers for one protocol run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub protocol: Protocol,
    pub messages: u64,
    pub rounds: u32,
    /// Simulated milliseconds between the first advance and completion (or now).
    pub elapsed_ms: f64,
    pub coverage: f64,
    pub node_count: usize,
    pub malicious_count: usize,
    pub is_complete: bool,
    pub termination: Option<Termination>,
}

impl RunSummary {
    pub fn from_state(state: &NetworkState) -> Self {
        Self {
            protocol: state.protocol,
            messages: state.total_messages_sent,
            rounds: state.round,
            elapsed_ms: state.elapsed_ms(),
            coverage: state.coverage,
            node_count: state.node_count(),
            malicious_count: state.malicious_count(),
            is_complete: state.is_complete,
            termination: state.termination,
        }
    }

    /// `messages × rounds`, the composite cost used for efficiency.
    pub fn cost(&self) -> f64 {
        self.messages as f64 * self.rounds as f64
    }
}

/// Flooding measured against TGL. Positive values favour TGL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// Percentage of flooding's messages that TGL did not need.
    pub message_reduction: f64,
    /// Flooding rounds minus TGL rounds.
    pub round_difference: i64,
    /// Flooding time minus TGL time, in simulated milliseconds.
    pub time_difference: f64,
    /// Percentage reduction of `messages × rounds`.
    pub efficiency_improvement: f64,
}

/// `(baseline − other) / baseline × 100`, or 0 for a zero baseline.
fn percent_reduction(baseline: f64, other: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (baseline - other) / baseline * 100.0
    }
}

/// Compare two summaries. `None` until both runs have sent a message.
pub fn compare(flooding: &RunSummary, hierarchical: &RunSummary) -> Option<ComparisonMetrics> {
    if flooding.messages == 0 || hierarchical.messages == 0 {
        return None;
    }

    Some(ComparisonMetrics {
        message_reduction: percent_reduction(flooding.messages as f64, hierarchical.messages as f64),
        round_difference: i64::from(flooding.rounds) - i64::from(hierarchical.rounds),
        time_difference: flooding.elapsed_ms - hierarchical.elapsed_ms,
        efficiency_improvement: percent_reduction(flooding.cost(), hierarchical.cost()),
    })
}

/// Compare the flooding and hierarchical snapshots directly.
pub fn compare_runs(flooding: &NetworkState, hierarchical: &NetworkState) -> Option<ComparisonMetrics> {
    compare(
        &RunSummary::from_state(flooding),
        &RunSummary::from_state(hierarchical),
    )
}
