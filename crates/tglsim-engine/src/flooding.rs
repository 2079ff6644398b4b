//! Flooding ("P2P") rounds.
//!
//! Each round, every active forwarding node that still has Idle neighbors
//! contacts `min(fanout, degree)` of them. At least one and at most
//! `useful_fraction` of those contacts target Idle neighbors; the rest go
//! to neighbors that already hold the message, modelling the redundant
//! traffic real gossip produces. Nodes whose neighbors are all covered stay
//! quiet, so a round with no sends means propagation is stuck.

use rand::Rng;
use tglsim_topology::{NetworkState, NodeId, NodeState};
use tglsim_utils::{round_to_usize, sample};
use tracing::debug;

use crate::fault::FaultModel;
use crate::settings::Settings;
use crate::step::Step;

/// Flooding parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodingParams {
    /// Contacts per node per round (capped by the node's degree).
    pub fanout: usize,
    /// Share of contacts reserved for Idle neighbors.
    pub useful_fraction: f64,
    pub max_rounds: u32,
}

impl Default for FloodingParams {
    fn default() -> Self {
        Self {
            fanout: 4,
            useful_fraction: 1.0 / 3.0,
            max_rounds: 50,
        }
    }
}

impl From<&Settings> for FloodingParams {
    fn from(settings: &Settings) -> Self {
        Self {
            fanout: settings.average_degree(),
            useful_fraction: settings.useful_fraction(),
            max_rounds: settings.max_rounds(),
        }
    }
}

/// Split `target_count` contacts into `(useful, redundant)`.
///
/// `useful = max(1, round(target_count × fraction))`, never above
/// `target_count`.
pub fn contact_split(target_count: usize, useful_fraction: f64) -> (usize, usize) {
    if target_count == 0 {
        return (0, 0);
    }
    let useful = round_to_usize(target_count as f64 * useful_fraction).clamp(1, target_count);
    (useful, target_count - useful)
}

/// Choose this round's targets for one sender.
///
/// Useful picks come from `idle` first and are topped up from `covered`;
/// redundant picks prefer what is left of `covered`, then of `idle`. The two
/// selections never overlap.
fn choose_targets<R: Rng + ?Sized>(
    idle: &[NodeId],
    covered: &[NodeId],
    useful_count: usize,
    redundant_count: usize,
    rng: &mut R,
) -> Vec<NodeId> {
    let mut picked = sample(rng, idle, useful_count);
    if picked.len() < useful_count {
        let top_up = sample(rng, covered, useful_count - picked.len());
        picked.extend(top_up);
    }

    let spare_covered: Vec<NodeId> = covered.iter().copied().filter(|id| !picked.contains(id)).collect();
    let spare_idle: Vec<NodeId> = idle.iter().copied().filter(|id| !picked.contains(id)).collect();

    let mut redundant = sample(rng, &spare_covered, redundant_count);
    if redundant.len() < redundant_count {
        let fallback = sample(rng, &spare_idle, redundant_count - redundant.len());
        redundant.extend(fallback);
    }

    picked.extend(redundant);
    picked
}

/// Advance a flooding network by one round.
///
/// Returns the input unchanged once the run is complete.
pub fn advance_round<F, R>(
    state: &NetworkState,
    params: &FloodingParams,
    faults: &F,
    rng: &mut R,
) -> NetworkState
where
    F: FaultModel + ?Sized,
    R: Rng + ?Sized,
{
    if state.is_complete {
        return state.clone();
    }

    let mut step = Step::begin(state);
    let round = state.round + 1;

    // Nodes activated during this round start forwarding next round.
    let senders: Vec<NodeId> = state
        .nodes
        .iter()
        .filter(|n| n.state == NodeState::Active && faults.forwards(n))
        .map(|n| n.id)
        .collect();

    for sender in senders {
        let neighbors = step.state.nodes[sender.index()].neighbors.clone();
        let (idle, covered): (Vec<NodeId>, Vec<NodeId>) = neighbors
            .iter()
            .partition(|id| step.state.nodes[id.index()].is_idle());

        if idle.is_empty() {
            continue;
        }

        let target_count = params.fanout.min(neighbors.len());
        let (useful, redundant) = contact_split(target_count, params.useful_fraction);

        for target in choose_targets(&idle, &covered, useful, redundant, rng) {
            step.send(sender, target, round);
        }
    }

    step.state.round = round;
    let sent = step.sent;
    let next = step.settle(true, params.max_rounds);

    debug!(
        round,
        sent,
        coverage = next.coverage,
        total = next.total_messages_sent,
        "flooding round"
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{Cooperative, DropMalicious};
    use rand::{rngs::StdRng, SeedableRng};
    use tglsim_topology::{build_flooding_topology, RunStage, Termination};

    fn params(fanout: usize) -> FloodingParams {
        FloodingParams {
            fanout,
            ..FloodingParams::default()
        }
    }

    #[test]
    fn split_follows_one_third_rule() {
        assert_eq!(contact_split(0, 1.0 / 3.0), (0, 0));
        assert_eq!(contact_split(1, 1.0 / 3.0), (1, 0));
        assert_eq!(contact_split(2, 1.0 / 3.0), (1, 1));
        assert_eq!(contact_split(4, 1.0 / 3.0), (1, 3));
        assert_eq!(contact_split(6, 1.0 / 3.0), (2, 4));
        assert_eq!(contact_split(8, 1.0 / 3.0), (3, 5));
        assert_eq!(contact_split(5, 1.0), (5, 0));
    }

    #[test]
    fn targets_are_distinct_and_prefer_idle_for_useful() {
        let mut rng = StdRng::seed_from_u64(4);
        let idle = [NodeId(1), NodeId(2)];
        let covered = [NodeId(3), NodeId(4), NodeId(5)];

        for _ in 0..50 {
            let picks = choose_targets(&idle, &covered, 1, 3, &mut rng);
            assert_eq!(picks.len(), 4);
            assert!(idle.contains(&picks[0]));
            let mut unique = picks.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn targets_fall_back_when_pools_run_short() {
        let mut rng = StdRng::seed_from_u64(4);
        // Redundant quota exceeds the covered pool: spill into idle.
        let picks = choose_targets(&[NodeId(1), NodeId(2), NodeId(3)], &[NodeId(9)], 1, 3, &mut rng);
        assert_eq!(picks.len(), 4);
        // Useful quota exceeds the idle pool: top up from covered.
        let picks = choose_targets(&[NodeId(1)], &[NodeId(8), NodeId(9)], 2, 0, &mut rng);
        assert_eq!(picks.len(), 2);
        assert!(picks.contains(&NodeId(1)));
    }

    #[test]
    fn first_round_activates_source_neighbors() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = build_flooding_topology(10, 4, 0.0, &mut rng).unwrap();
        let next = advance_round(&state, &params(4), &DropMalicious, &mut rng);

        assert_eq!(next.round, 1);
        assert_eq!(next.stage, RunStage::Running);
        assert_eq!(next.total_messages_sent, 4);
        assert_eq!(next.transfers.len(), 4);
        for id in [1, 2, 8, 9] {
            assert_eq!(next.nodes[id].received_at_round, Some(1));
        }
        assert_eq!(next.covered_count(), 5);
        assert!((next.coverage - 50.0).abs() < 1e-9);
        assert_eq!(next.edges.iter().filter(|e| e.active).count(), 4);

        // The input snapshot is untouched.
        assert_eq!(state.round, 0);
        assert_eq!(state.covered_count(), 1);
    }

    #[test]
    fn ten_node_ring_saturates_quickly() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = build_flooding_topology(10, 4, 0.0, &mut rng).unwrap();

        while !state.is_complete {
            state = advance_round(&state, &params(4), &DropMalicious, &mut rng);
        }

        assert_eq!(state.coverage, 100.0);
        assert_eq!(state.termination, Some(Termination::FullCoverage));
        assert!(state.round <= 5);
        assert!(state.total_messages_sent < 10 * 4);
    }

    #[test]
    fn redundant_sends_carry_no_transfer() {
        let mut rng = StdRng::seed_from_u64(5);
        let state = build_flooding_topology(10, 4, 0.0, &mut rng).unwrap();
        let first = advance_round(&state, &params(4), &DropMalicious, &mut rng);
        let second = advance_round(&first, &params(4), &DropMalicious, &mut rng);

        let new_transfers = second.transfers.iter().filter(|t| t.round == 2).count();
        let newly_covered = second.covered_count() - first.covered_count();
        let messages = second.total_messages_sent - first.total_messages_sent;

        assert_eq!(new_transfers, newly_covered);
        // Five senders with four contacts each, at most five of them useful.
        assert!(messages > newly_covered as u64);
        for t in second.transfers.iter().filter(|t| t.round == 2) {
            assert_eq!(second.nodes[t.target.index()].received_at_round, Some(2));
        }
    }

    #[test]
    fn malicious_source_neighbors_drop_messages() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = build_flooding_topology(10, 2, 0.0, &mut rng).unwrap();
        state.nodes[1].is_malicious = true;
        state.nodes[9].is_malicious = true;

        let mut rounds = 0;
        while !state.is_complete {
            state = advance_round(&state, &params(2), &DropMalicious, &mut rng);
            rounds += 1;
            assert!(rounds < 10);
        }

        // Round 1 reaches both blockers, round 2 sends nothing.
        assert_eq!(state.round, 2);
        assert_eq!(state.termination, Some(Termination::Stagnated));
        assert!(state.is_stagnated());
        assert_eq!(state.covered_count(), 3);
    }

    #[test]
    fn cooperative_model_ignores_malicious_flags() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = build_flooding_topology(10, 2, 0.0, &mut rng).unwrap();
        state.nodes[1].is_malicious = true;
        state.nodes[9].is_malicious = true;

        while !state.is_complete {
            state = advance_round(&state, &params(2), &Cooperative, &mut rng);
        }
        assert_eq!(state.termination, Some(Termination::FullCoverage));
    }

    #[test]
    fn round_limit_stops_the_run() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = build_flooding_topology(60, 2, 0.0, &mut rng).unwrap();
        let p = FloodingParams {
            fanout: 2,
            max_rounds: 10,
            ..FloodingParams::default()
        };

        while !state.is_complete {
            state = advance_round(&state, &p, &DropMalicious, &mut rng);
        }
        assert_eq!(state.round, 10);
        assert_eq!(state.termination, Some(Termination::RoundLimit));
        assert!(state.coverage < 100.0);
    }

    #[test]
    fn complete_state_is_returned_unchanged() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut state = build_flooding_topology(10, 4, 0.0, &mut rng).unwrap();
        while !state.is_complete {
            state = advance_round(&state, &params(4), &DropMalicious, &mut rng);
        }

        let again = advance_round(&state, &params(4), &DropMalicious, &mut rng);
        assert_eq!(again, state);
    }
}
