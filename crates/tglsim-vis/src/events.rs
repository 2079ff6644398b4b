//! Timeline events and the snapshot published to observers.

use serde::{Deserialize, Serialize};
use tglsim_metrics::ComparisonMetrics;
use tglsim_topology::{NetworkState, Phase, Protocol, Termination};

use crate::scheduler::{PlaybackSpeed, PlaybackState};

/// Something that happened during a run, tagged with the frame it happened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Both networks were rebuilt.
    Reset {
        seed: u64,
        node_count: usize,
        relay_count: usize,
        leaf_count: usize,
        malicious_percentage: f64,
        frame: u64,
    },

    /// A flooding round ran.
    RoundAdvanced {
        round: u32,
        coverage: f64,
        messages: u64,
        frame: u64,
    },

    /// A TGL stage ran. `phase` is the stage that just executed.
    StageAdvanced {
        phase: Phase,
        round: u32,
        coverage: f64,
        messages: u64,
        frame: u64,
    },

    /// One protocol finished.
    RunCompleted {
        protocol: Protocol,
        reason: Termination,
        round: u32,
        coverage: f64,
        messages: u64,
        frame: u64,
    },

    /// Both protocols finished.
    AllCompleted {
        comparison: Option<ComparisonMetrics>,
        frame: u64,
    },
}

impl SimEvent {
    pub fn frame(&self) -> u64 {
        match self {
            SimEvent::Reset { frame, .. } => *frame,
            SimEvent::RoundAdvanced { frame, .. } => *frame,
            SimEvent::StageAdvanced { frame, .. } => *frame,
            SimEvent::RunCompleted { frame, .. } => *frame,
            SimEvent::AllCompleted { frame, .. } => *frame,
        }
    }
}

/// Playback status sent alongside every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub frame: u64,
    pub seed: u64,
}

/// Everything a renderer needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub playback: PlaybackStatus,
    pub flooding: NetworkState,
    pub hierarchical: NetworkState,
    pub comparison: Option<ComparisonMetrics>,
}

impl SimSnapshot {
    pub fn is_finished(&self) -> bool {
        self.flooding.is_complete && self.hierarchical.is_complete
    }
}
