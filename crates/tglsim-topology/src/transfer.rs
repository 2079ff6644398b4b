//! In-flight message deliveries.

use tglsim_utils::lerp3;

use crate::{EdgeId, NodeId};

/// Identifier of a transfer, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferId(pub u64);

/// Delivery status of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferState {
    /// Emitted, not yet ticked.
    Pending,
    /// Travelling along its edge.
    InProgress,
    /// Arrived at the target.
    Completed,
    /// Dropped in flight.
    Failed,
}

/// One message travelling from `source` to `target` along `edge`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub id: TransferId,
    pub source: NodeId,
    pub target: NodeId,
    pub edge: EdgeId,
    /// 0.0 at the source, 1.0 at the target.
    pub progress: f32,
    pub state: TransferState,
    /// Simulated clock (ms) when the transfer started moving.
    pub start_time_ms: f64,
    pub end_time_ms: Option<f64>,
    /// Round in which the engine emitted this transfer.
    pub round: u32,
}

impl Transfer {
    /// A pending transfer created at simulated time `now_ms`.
    pub fn new(
        id: TransferId,
        source: NodeId,
        target: NodeId,
        edge: EdgeId,
        round: u32,
        now_ms: f64,
    ) -> Self {
        Self {
            id,
            source,
            target,
            edge,
            progress: 0.0,
            state: TransferState::Pending,
            start_time_ms: now_ms,
            end_time_ms: None,
            round,
        }
    }

    /// Whether the transfer has reached its target.
    pub fn arrived(&self) -> bool {
        self.progress >= 1.0
    }

    /// Still counts against the "no overlapping rounds" gate.
    pub fn in_flight(&self) -> bool {
        matches!(self.state, TransferState::Pending | TransferState::InProgress)
    }

    /// Interpolated position between the endpoint layout positions.
    pub fn position_between(&self, from: [f32; 3], to: [f32; 3]) -> [f32; 3] {
        lerp3(from, to, self.progress.clamp(0.0, 1.0))
    }
}
