//! The per-protocol aggregate: nodes, edges, transfers and run counters.

use std::fmt;

use crate::{Edge, Node, NodeId, Transfer};

/// Which dissemination protocol a network runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    /// Epidemic flooding over a k-regular ring ("P2P").
    Flooding,
    /// Three-stage Push/Gossip/Pull over relays and leaves ("TGL").
    Hierarchical,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Flooding => write!(f, "P2P"),
            Protocol::Hierarchical => write!(f, "TGL"),
        }
    }
}

/// Run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunStage {
    #[default]
    Idle,
    /// Topology built, nothing advanced yet.
    Initializing,
    Running,
    Completed,
    Error,
}

/// Position inside one TGL round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Leaves push to their relays.
    #[default]
    Push,
    /// Relays gossip across the core mesh.
    Gossip,
    /// Relays deliver to their leaves; closes the round.
    Pull,
}

impl Phase {
    /// The phase that follows this one; `Pull` wraps to `Push`.
    pub fn next(self) -> Self {
        match self {
            Phase::Push => Phase::Gossip,
            Phase::Gossip => Phase::Pull,
            Phase::Pull => Phase::Push,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Push => write!(f, "push"),
            Phase::Gossip => write!(f, "gossip"),
            Phase::Pull => write!(f, "pull"),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Every node holds the message.
    FullCoverage,
    /// A whole round sent nothing while Idle nodes remain.
    Stagnated,
    /// The configured round cap was hit first.
    RoundLimit,
}

/// Snapshot of one protocol run.
///
/// The engine never mutates a caller's snapshot: every advance clones the
/// input, applies one step and returns the result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkState {
    pub protocol: Protocol,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub transfers: Vec<Transfer>,
    pub round: u32,
    /// Next TGL stage to run. Always `Push` for flooding.
    pub phase: Phase,
    /// Percentage of nodes not Idle.
    pub coverage: f64,
    pub stage: RunStage,
    pub source: NodeId,
    pub total_messages_sent: u64,
    /// Messages sent since the last round boundary.
    pub round_messages: u64,
    pub start_time_ms: Option<f64>,
    pub end_time_ms: Option<f64>,
    /// Simulated clock, advanced by the transfer tracker.
    pub clock_ms: f64,
    pub is_complete: bool,
    pub termination: Option<Termination>,
    pub next_transfer_id: u64,
}

impl NetworkState {
    /// Wrap freshly built nodes and edges into an initial snapshot.
    pub fn new(protocol: Protocol, nodes: Vec<Node>, edges: Vec<Edge>, source: NodeId) -> Self {
        let coverage = coverage_of(&nodes);
        Self {
            protocol,
            nodes,
            edges,
            transfers: Vec::new(),
            round: 0,
            phase: Phase::Push,
            coverage,
            stage: RunStage::Initializing,
            source,
            total_messages_sent: 0,
            round_messages: 0,
            start_time_ms: None,
            end_time_ms: None,
            clock_ms: 0.0,
            is_complete: false,
            termination: None,
            next_transfer_id: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that hold the message.
    pub fn covered_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_idle()).count()
    }

    pub fn idle_count(&self) -> usize {
        self.nodes.len() - self.covered_count()
    }

    pub fn malicious_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_malicious).count()
    }

    pub fn relay_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.is_relay).map(|n| n.id)
    }

    pub fn leaf_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.id)
    }

    pub fn recompute_coverage(&mut self) {
        self.coverage = coverage_of(&self.nodes);
    }

    pub fn has_transfers_in_flight(&self) -> bool {
        !self.transfers.is_empty()
    }

    /// Run completed with Idle nodes left over.
    pub fn is_stagnated(&self) -> bool {
        self.is_complete && self.coverage < 100.0
    }

    /// Simulated time spent running: end − start, or now − start while running.
    pub fn elapsed_ms(&self) -> f64 {
        match self.start_time_ms {
            Some(start) => self.end_time_ms.unwrap_or(self.clock_ms) - start,
            None => 0.0,
        }
    }

    /// Layout position of a transfer's head, for painting.
    pub fn transfer_position(&self, transfer: &Transfer) -> Option<[f32; 3]> {
        let from = self.node(transfer.source)?.position;
        let to = self.node(transfer.target)?.position;
        Some(transfer.position_between(from, to))
    }

    /// Mark the run as started (first advance).
    pub fn begin(&mut self) {
        if self.start_time_ms.is_none() {
            self.start_time_ms = Some(self.clock_ms);
        }
        if matches!(self.stage, RunStage::Idle | RunStage::Initializing) {
            self.stage = RunStage::Running;
        }
    }

    /// Freeze the run. Further advances are no-ops.
    pub fn finish(&mut self, reason: Termination) {
        self.is_complete = true;
        self.termination = Some(reason);
        self.stage = RunStage::Completed;
        self.end_time_ms = Some(self.clock_ms);
    }

    /// Allocate the next transfer id.
    pub fn take_transfer_id(&mut self) -> crate::TransferId {
        let id = crate::TransferId(self.next_transfer_id);
        self.next_transfer_id += 1;
        id
    }
}

/// `covered / total * 100`, or 0 for an empty network.
pub fn coverage_of(nodes: &[Node]) -> f64 {
    if nodes.is_empty() {
        return 0.0;
    }
    let covered = nodes.iter().filter(|n| !n.is_idle()).count();
    covered as f64 / nodes.len() as f64 * 100.0
}
