//! Undirected links between nodes.

use std::collections::HashMap;

use crate::NodeId;

/// Identifier of an edge; `EdgeId(i)` is stored at `edges[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub usize);

/// An undirected link. `source` is always the lower node id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Carried a message in the latest round or stage.
    pub active: bool,
    pub weight: f32,
    pub last_used_round: Option<u32>,
}

impl Edge {
    /// Create an inactive edge, normalising the endpoint order.
    pub fn new(id: EdgeId, a: NodeId, b: NodeId) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id,
            source,
            target,
            active: false,
            weight: 1.0,
            last_used_round: None,
        }
    }

    /// Whether this edge joins `a` and `b` (in either order).
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Lookup from an unordered node pair to the edge joining them.
#[derive(Debug, Default)]
pub struct EdgeIndex {
    by_pair: HashMap<(NodeId, NodeId), EdgeId>,
}

impl EdgeIndex {
    pub fn build(edges: &[Edge]) -> Self {
        let by_pair = edges
            .iter()
            .map(|e| ((e.source, e.target), e.id))
            .collect();
        Self { by_pair }
    }

    pub fn get(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.by_pair.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_normalised() {
        let edge = Edge::new(EdgeId(0), NodeId(5), NodeId(2));
        assert_eq!(edge.source, NodeId(2));
        assert_eq!(edge.target, NodeId(5));
        assert!(edge.connects(NodeId(5), NodeId(2)));
        assert!(edge.connects(NodeId(2), NodeId(5)));
        assert!(!edge.connects(NodeId(2), NodeId(3)));
    }

    #[test]
    fn other_endpoint() {
        let edge = Edge::new(EdgeId(0), NodeId(1), NodeId(4));
        assert_eq!(edge.other(NodeId(1)), Some(NodeId(4)));
        assert_eq!(edge.other(NodeId(4)), Some(NodeId(1)));
        assert_eq!(edge.other(NodeId(9)), None);
    }

    #[test]
    fn index_lookup_either_order() {
        let edges = vec![
            Edge::new(EdgeId(0), NodeId(0), NodeId(1)),
            Edge::new(EdgeId(1), NodeId(3), NodeId(1)),
        ];
        let index = EdgeIndex::build(&edges);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(NodeId(1), NodeId(0)), Some(EdgeId(0)));
        assert_eq!(index.get(NodeId(1), NodeId(3)), Some(EdgeId(1)));
        assert_eq!(index.get(NodeId(0), NodeId(3)), None);
    }
}
