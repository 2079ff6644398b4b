//! Fault injection: choosing which nodes drop everything they receive.

use rand::Rng;
use tglsim_utils::sample;

use crate::{Node, NodeId};

/// Number of malicious nodes for `candidates` eligible nodes at `percentage`.
///
/// Rounds down, so a percentage can never exceed the eligible pool.
pub fn malicious_count(candidates: usize, percentage: f64) -> usize {
    let raw = candidates as f64 * percentage.clamp(0.0, 100.0) / 100.0;
    (raw.floor() as usize).min(candidates)
}

/// Flag a uniform random subset of `nodes` as malicious.
///
/// `protect` (the message source) is never picked. Existing flags are
/// cleared first. Returns the ids that were flagged.
pub fn mark_malicious<R: Rng + ?Sized>(
    nodes: &mut [Node],
    protect: NodeId,
    percentage: f64,
    rng: &mut R,
) -> Vec<NodeId> {
    for node in nodes.iter_mut() {
        node.is_malicious = false;
    }

    let candidates: Vec<NodeId> = nodes
        .iter()
        .map(|n| n.id)
        .filter(|&id| id != protect)
        .collect();
    let count = malicious_count(candidates.len(), percentage);

    let chosen = sample(rng, &candidates, count);
    for id in &chosen {
        nodes[id.index()].is_malicious = true;
    }
    chosen
}
