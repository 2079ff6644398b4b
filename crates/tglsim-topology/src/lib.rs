//! TGL Simulator Topology
//!
//! The network model shared by both protocols, plus the two graph builders.
//!
//! # Model
//!
//! A [`NetworkState`] owns every [`Node`], [`Edge`] and in-flight
//! [`Transfer`] of one protocol run. Node and edge ids are dense indices into
//! those vectors. Edges are static once built.
//!
//! # Builders
//!
//! - [`build_flooding_topology`]: k-regular ring, node 0 is the source.
//! - [`build_hierarchical_topology`]: complete relay mesh plus leaves wired
//!   round-robin to `min(relays, push_budget)` relays; the first leaf is the
//!   source.
//!
//! Both validate their inputs and return [`TopologyError`] rather than a
//! malformed graph. Randomness (malicious selection) comes from a caller
//! supplied generator.

mod edge;
mod error;
pub mod layout;
mod malicious;
mod network;
mod node;
mod ring;
mod tiered;
mod transfer;

pub use edge::{Edge, EdgeId, EdgeIndex};
pub use error::{Result, TopologyError};
pub use malicious::{malicious_count, mark_malicious};
pub use network::{coverage_of, NetworkState, Phase, Protocol, RunStage, Termination};
pub use node::{Node, NodeId, NodeState, ParseNodeIdError};
pub use ring::{
    build_flooding_topology, ring_degree, ring_neighbors, validate_ring, MIN_RING_DEGREE,
    MIN_RING_NODES,
};
pub use tiered::{build_hierarchical_topology, connections_per_leaf, leaf_relays};
pub use transfer::{Transfer, TransferId, TransferState};
