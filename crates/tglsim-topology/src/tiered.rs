//! Two-tier TGL topology: a fully meshed relay core plus leaves.
//!
//! Relays occupy ids `0..relay_count`, leaves `relay_count..`. Leaf `i`
//! (counting among leaves) links to relays `(i + offset) % relay_count` for
//! `offset in 0..min(relay_count, push_budget)`, which spreads leaves evenly
//! across the core. The first leaf is the message source.

use rand::Rng;
use tracing::debug;

use crate::error::{check_percentage, Result, TopologyError};
use crate::layout::{circle, LEAF_RADIUS, RELAY_RADIUS};
use crate::malicious::mark_malicious;
use crate::{Edge, EdgeId, NetworkState, Node, NodeId, Protocol};

/// How many relays each leaf links to.
pub fn connections_per_leaf(relay_count: usize, push_budget: usize) -> usize {
    relay_count.min(push_budget)
}

/// Relay indices assigned to the `leaf_index`-th leaf.
pub fn leaf_relays(leaf_index: usize, relay_count: usize, push_budget: usize) -> Vec<usize> {
    (0..connections_per_leaf(relay_count, push_budget))
        .map(|offset| (leaf_index + offset) % relay_count)
        .collect()
}

/// Build the hierarchical network.
///
/// Malicious nodes are drawn from relays and leaves together; only the
/// source leaf is exempt.
pub fn build_hierarchical_topology<R: Rng + ?Sized>(
    relay_count: usize,
    leaf_count: usize,
    push_budget: usize,
    malicious_percentage: f64,
    rng: &mut R,
) -> Result<NetworkState> {
    if relay_count == 0 {
        return Err(TopologyError::NoRelays);
    }
    if leaf_count == 0 {
        return Err(TopologyError::NoLeaves);
    }
    if push_budget == 0 {
        return Err(TopologyError::ZeroPushBudget);
    }
    check_percentage(malicious_percentage)?;

    let relay_pos = circle(relay_count, RELAY_RADIUS, 0.0);
    let leaf_pos = circle(leaf_count, LEAF_RADIUS, 0.0);

    let mut nodes: Vec<Node> = relay_pos
        .into_iter()
        .chain(leaf_pos)
        .enumerate()
        .map(|(i, pos)| {
            let mut node = Node::new(NodeId(i), pos);
            node.is_relay = i < relay_count;
            node
        })
        .collect();

    let mut edges = Vec::new();
    let mut link = |nodes: &mut [Node], a: usize, b: usize| {
        nodes[a].neighbors.push(NodeId(b));
        nodes[b].neighbors.push(NodeId(a));
        edges.push(Edge::new(EdgeId(edges.len()), NodeId(a), NodeId(b)));
    };

    for a in 0..relay_count {
        for b in (a + 1)..relay_count {
            link(&mut nodes, a, b);
        }
    }
    for leaf in 0..leaf_count {
        for relay in leaf_relays(leaf, relay_count, push_budget) {
            link(&mut nodes, relay, relay_count + leaf);
        }
    }

    let source = NodeId(relay_count);
    nodes[source.index()].activate(0);
    let flagged = mark_malicious(&mut nodes, source, malicious_percentage, rng);

    debug!(
        relay_count,
        leaf_count,
        push_budget,
        edges = edges.len(),
        malicious = flagged.len(),
        "built hierarchical topology"
    );

    Ok(NetworkState::new(Protocol::Hierarchical, nodes, edges, source))
}
