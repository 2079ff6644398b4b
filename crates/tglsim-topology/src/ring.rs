//! k-regular ring topology for flooding.
//!
//! Node `i` links to its `⌊k/2⌋` successors and `⌊k/2⌋` predecessors
//! (indices mod `n`). For odd `k` it also links to successor `⌊k/2⌋ + 1`.
//! Links are undirected, so that extra successor is also an extra
//! predecessor of the node on the other end; the resulting degree is `k`
//! rounded up to the next even number, capped at `n - 1` (see
//! [`ring_degree`]).
//!
//! Node 0 is the message source.

use rand::Rng;
use tglsim_utils::dedup;
use tracing::debug;

use crate::error::{check_percentage, Result, TopologyError};
use crate::layout::{sphere, FLOODING_RADIUS};
use crate::malicious::mark_malicious;
use crate::{Edge, EdgeId, NetworkState, Node, NodeId, Protocol};

/// Smallest ring the builder accepts.
pub const MIN_RING_NODES: usize = 2;

/// Smallest ring degree.
pub const MIN_RING_DEGREE: usize = 2;

/// Check `(node_count, degree)` against the ring constraints.
pub fn validate_ring(node_count: usize, degree: usize) -> Result<()> {
    if node_count < MIN_RING_NODES {
        return Err(TopologyError::TooFewNodes {
            min: MIN_RING_NODES,
            actual: node_count,
        });
    }
    if degree < MIN_RING_DEGREE {
        return Err(TopologyError::DegreeTooSmall { degree });
    }
    if degree > node_count - 1 {
        return Err(TopologyError::DegreeTooLarge {
            degree,
            node_count,
            max: node_count - 1,
        });
    }
    Ok(())
}

/// Actual per-node neighbor count of a ring built with `degree`.
///
/// Even degrees are exact. Odd degrees gain one link from the reciprocal
/// extra successor, unless that would exceed `node_count - 1`.
pub const fn ring_degree(node_count: usize, degree: usize) -> usize {
    let even = degree + degree % 2;
    let max = node_count.saturating_sub(1);
    if even > max {
        max
    } else {
        even
    }
}

/// Neighbor indices of `index` on a ring of `node_count` nodes.
///
/// Successors come first, then predecessors, each ordered by distance.
/// Wrap-around coincidences (e.g. the antipode on an even ring) are
/// collapsed, and a node is never its own neighbor.
pub fn ring_neighbors(index: usize, node_count: usize, degree: usize) -> Vec<usize> {
    let half = degree / 2;
    let reach = half + degree % 2;

    let successors = (1..=reach).map(|d| (index + d) % node_count);
    // With odd degree the reach-th predecessor is the reciprocal link of
    // some other node's extra successor.
    let predecessors = (1..=reach).map(|d| (index + node_count - d % node_count) % node_count);

    dedup(successors.chain(predecessors))
        .into_iter()
        .filter(|&j| j != index)
        .collect()
}

/// Build the flooding network.
///
/// `malicious_percentage` of the non-source nodes are flagged malicious,
/// picked uniformly with `rng`. Node 0 starts Active at round 0.
pub fn build_flooding_topology<R: Rng + ?Sized>(
    node_count: usize,
    degree: usize,
    malicious_percentage: f64,
    rng: &mut R,
) -> Result<NetworkState> {
    validate_ring(node_count, degree)?;
    check_percentage(malicious_percentage)?;

    let positions = sphere(node_count, FLOODING_RADIUS);
    let mut nodes: Vec<Node> = positions
        .into_iter()
        .enumerate()
        .map(|(i, pos)| {
            let mut node = Node::new(NodeId(i), pos);
            node.neighbors = ring_neighbors(i, node_count, degree)
                .into_iter()
                .map(NodeId)
                .collect();
            node
        })
        .collect();

    let mut edges = Vec::with_capacity(node_count * ring_degree(node_count, degree) / 2);
    for node in &nodes {
        for &neighbor in &node.neighbors {
            if node.id < neighbor {
                edges.push(Edge::new(EdgeId(edges.len()), node.id, neighbor));
            }
        }
    }

    let source = NodeId(0);
    nodes[0].activate(0);
    let flagged = mark_malicious(&mut nodes, source, malicious_percentage, rng);

    debug!(
        node_count,
        degree,
        edges = edges.len(),
        malicious = flagged.len(),
        "built flooding ring"
    );

    Ok(NetworkState::new(Protocol::Flooding, nodes, edges, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeState, RunStage};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn build(n: usize, k: usize) -> NetworkState {
        let mut rng = StdRng::seed_from_u64(42);
        build_flooding_topology(n, k, 0.0, &mut rng).unwrap()
    }

    #[test]
    fn rejects_degenerate_rings() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            build_flooding_topology(1, 2, 0.0, &mut rng).unwrap_err(),
            TopologyError::TooFewNodes { min: 2, actual: 1 }
        );
        assert_eq!(
            build_flooding_topology(10, 1, 0.0, &mut rng).unwrap_err(),
            TopologyError::DegreeTooSmall { degree: 1 }
        );
        assert!(matches!(
            build_flooding_topology(10, 10, 0.0, &mut rng),
            Err(TopologyError::DegreeTooLarge { max: 9, .. })
        ));
        assert!(matches!(
            build_flooding_topology(10, 4, 120.0, &mut rng),
            Err(TopologyError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn even_degree_neighbors() {
        assert_eq!(ring_neighbors(0, 10, 4), vec![1, 2, 9, 8]);
        assert_eq!(ring_neighbors(5, 10, 2), vec![6, 4]);
    }

    #[test]
    fn odd_degree_adds_reciprocal_link() {
        // k = 3: ±1 plus the extra successor 2, whose reciprocal is -2
        assert_eq!(ring_neighbors(0, 10, 3), vec![1, 2, 9, 8]);
        assert_eq!(ring_degree(10, 3), 4);
        assert_eq!(ring_degree(0, 4), 0);
        assert_eq!(ring_degree(1, 3), 0);
    }

    #[test]
    fn odd_degree_on_even_ring_meets_at_antipode() {
        // n = 10, k = 9: successor 5 and predecessor 5 coincide
        let neighbors = ring_neighbors(0, 10, 9);
        assert_eq!(neighbors.len(), 9);
        assert_eq!(ring_degree(10, 9), 9);
    }

    #[test]
    fn initial_state() {
        let state = build(10, 4);

        assert_eq!(state.protocol, Protocol::Flooding);
        assert_eq!(state.stage, RunStage::Initializing);
        assert_eq!(state.round, 0);
        assert_eq!(state.source, NodeId(0));
        assert!((state.coverage - 10.0).abs() < 1e-9);

        assert_eq!(state.nodes[0].state, NodeState::Active);
        assert_eq!(state.nodes[0].received_at_round, Some(0));
        assert!(state.nodes[1..].iter().all(|n| n.is_idle()));
        assert!(state.nodes.iter().all(|n| !n.is_relay));
    }

    #[test]
    fn edge_count_matches_degree() {
        let state = build(10, 4);
        assert_eq!(state.edges.len(), 10 * 4 / 2);
        for (i, edge) in state.edges.iter().enumerate() {
            assert_eq!(edge.id, EdgeId(i));
            assert!(edge.source < edge.target);
        }
    }

    #[test]
    fn malicious_nodes_exclude_source() {
        let mut rng = StdRng::seed_from_u64(3);
        let state = build_flooding_topology(20, 4, 50.0, &mut rng).unwrap();
        assert!(!state.nodes[0].is_malicious);
        assert_eq!(state.malicious_count(), 9); // floor(19 * 0.5)
    }

    proptest! {
        #[test]
        fn ring_is_regular_and_simple(n in 2usize..80, k_seed in any::<usize>()) {
            prop_assume!(n >= 3);
            let k = 2 + k_seed % (n - 2);
            let state = build(n, k);
            let expected = ring_degree(n, k);

            prop_assert_eq!(state.nodes.len(), n);
            for node in &state.nodes {
                prop_assert_eq!(node.neighbors.len(), expected);
                prop_assert!(!node.neighbors.contains(&node.id));
                let unique: HashSet<_> = node.neighbors.iter().collect();
                prop_assert_eq!(unique.len(), node.neighbors.len());
            }
        }

        #[test]
        fn adjacency_is_symmetric_and_matches_edges(n in 3usize..60, k_seed in any::<usize>()) {
            let k = 2 + k_seed % (n - 2);
            let state = build(n, k);

            for node in &state.nodes {
                for &nb in &node.neighbors {
                    prop_assert!(state.nodes[nb.index()].neighbors.contains(&node.id));
                }
            }
            prop_assert_eq!(state.edges.len(), n * ring_degree(n, k) / 2);
        }
    }
}
