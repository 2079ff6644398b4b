//! Three-stage TGL cycle: Push, Gossip, Pull.
//!
//! Each call runs exactly one stage. Push and Gossip stamp activations with
//! the current round; Pull stamps them with the next one and closes the round.

use rand::Rng;
use tglsim_topology::{NetworkState, Node, NodeId, NodeState, Phase};
use tglsim_utils::sample;
use tracing::debug;

use crate::fault::FaultModel;
use crate::settings::Settings;
use crate::step::Step;

/// Per-stage message budgets. Each budget applies per sending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageBudgets {
    pub push: usize,
    pub gossip: usize,
    pub pull: usize,
    pub max_rounds: u32,
}

impl Default for StageBudgets {
    fn default() -> Self {
        Self {
            push: 2,
            gossip: 3,
            pull: 4,
            max_rounds: 50,
        }
    }
}

impl From<&Settings> for StageBudgets {
    fn from(settings: &Settings) -> Self {
        Self {
            push: settings.push_budget(),
            gossip: settings.gossip_budget(),
            pull: settings.pull_budget(),
            max_rounds: settings.max_rounds(),
        }
    }
}

impl StageBudgets {
    fn for_phase(&self, phase: Phase) -> usize {
        match phase {
            Phase::Push => self.push,
            Phase::Gossip => self.gossip,
            Phase::Pull => self.pull,
        }
    }
}

/// Whether `node` sends during `phase`: leaves push, relays gossip and pull.
fn sends_in(phase: Phase, node: &Node) -> bool {
    match phase {
        Phase::Push => node.is_leaf(),
        Phase::Gossip | Phase::Pull => node.is_relay,
    }
}

/// Whether `node` is a valid receiver during `phase`.
fn receives_in(phase: Phase, node: &Node) -> bool {
    match phase {
        Phase::Push | Phase::Gossip => node.is_relay,
        Phase::Pull => node.is_leaf(),
    }
}

/// Run the stage named by `state.phase` and return the next snapshot.
///
/// Returns the input unchanged once the run is complete. Stagnation and the
/// round cap are only checked after Pull, so a quiet Push or Gossip never
/// ends the run early.
pub fn advance_stage<F, R>(
    state: &NetworkState,
    budgets: &StageBudgets,
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

    let phase = state.phase;
    let budget = budgets.for_phase(phase);
    let stamp = match phase {
        Phase::Pull => state.round + 1,
        Phase::Push | Phase::Gossip => state.round,
    };

    let mut step = Step::begin(state);

    let senders: Vec<NodeId> = state
        .nodes
        .iter()
        .filter(|n| n.state == NodeState::Active && sends_in(phase, n) && faults.forwards(n))
        .map(|n| n.id)
        .collect();

    for sender in senders {
        let candidates: Vec<NodeId> = step.state.nodes[sender.index()]
            .neighbors
            .iter()
            .copied()
            .filter(|id| {
                let node = &step.state.nodes[id.index()];
                node.is_idle() && receives_in(phase, node)
            })
            .collect();

        for target in sample(rng, &candidates, budget) {
            step.send(sender, target, stamp);
        }
    }

    let round_closed = phase == Phase::Pull;
    if round_closed {
        step.state.round += 1;
    }
    step.state.phase = phase.next();

    let sent = step.sent;
    let next = step.settle(round_closed, budgets.max_rounds);

    debug!(
        %phase,
        round = next.round,
        sent,
        coverage = next.coverage,
        total = next.total_messages_sent,
        "tgl stage"
    );
    next
}
