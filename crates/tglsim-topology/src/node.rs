//! Nodes and their propagation state.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifier of a node within one [`NetworkState`](crate::NetworkState).
///
/// Ids are dense: `NodeId(i)` is always stored at `nodes[i]`. At the
/// boundary (display, serialization) they render as `"node-<i>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Position of this node in the owning node list.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Failure to parse a `"node-<i>"` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid node id {0:?}, expected \"node-<index>\"")]
pub struct ParseNodeIdError(String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("node-")
            .and_then(|n| n.parse().ok())
            .map(NodeId)
            .ok_or_else(|| ParseNodeIdError(s.to_string()))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for NodeId {
    type Error = ParseNodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle of a node with respect to the message being disseminated.
///
/// Coverage counts every node that is not [`NodeState::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeState {
    /// Has not received the message.
    #[default]
    Idle,
    /// Holds the message and forwards it.
    Active,
    /// Currently emitting a transfer (display hint).
    Sending,
    /// Currently receiving a transfer (display hint).
    Receiving,
    /// Holds the message and has stopped forwarding.
    Completed,
    /// Holds a corrupted copy.
    Failed,
}

impl NodeState {
    /// Whether the node still lacks the message.
    #[inline]
    pub fn is_idle(self) -> bool {
        matches!(self, NodeState::Idle)
    }
}

/// A participant in the simulated network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    /// Layout position, only used for painting.
    pub position: [f32; 3],
    pub state: NodeState,
    pub neighbors: Vec<NodeId>,
    /// TGL role: relays form the core mesh, everything else is a leaf.
    pub is_relay: bool,
    /// Malicious nodes receive but never forward.
    pub is_malicious: bool,
    /// Round at which the node first left [`NodeState::Idle`].
    pub received_at_round: Option<u32>,
}

impl Node {
    /// Create an idle, honest node with no neighbors.
    pub fn new(id: NodeId, position: [f32; 3]) -> Self {
        Self {
            id,
            position,
            state: NodeState::Idle,
            neighbors: Vec::new(),
            is_relay: false,
            is_malicious: false,
            received_at_round: None,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// TGL leaves are the non-relay nodes.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        !self.is_relay
    }

    /// Deliver the message. Returns `true` only on the Idle → Active transition;
    /// a node that already holds the message keeps its original round stamp.
    pub fn activate(&mut self, round: u32) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = NodeState::Active;
        self.received_at_round = Some(round);
        true
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}
