//! Machinery shared by flooding rounds and TGL stages: cloning the snapshot,
//! recording sends, and deciding termination.

use tglsim_topology::{EdgeIndex, NetworkState, NodeId, Termination, Transfer};
use tracing::{info, warn};

/// One in-progress transition from a snapshot to its successor.
pub(crate) struct Step {
    pub state: NetworkState,
    edges: EdgeIndex,
    /// Messages sent during this step.
    pub sent: u64,
}

impl Step {
    /// Clone `prev`, mark the run as started and clear last step's edge usage.
    pub fn begin(prev: &NetworkState) -> Self {
        let mut state = prev.clone();
        state.begin();
        for edge in &mut state.edges {
            edge.active = false;
        }
        let edges = EdgeIndex::build(&state.edges);
        Self {
            state,
            edges,
            sent: 0,
        }
    }

    /// Send the message from `from` to `to`.
    ///
    /// Every send counts as a message and marks the joining edge. Only a
    /// still Idle `to` gets a transfer and is activated with `round` as its
    /// receive stamp; sends to covered nodes are pure overhead.
    /// Returns whether `to` was newly activated.
    pub fn send(&mut self, from: NodeId, to: NodeId, round: u32) -> bool {
        let Some(edge) = self.edges.get(from, to) else {
            warn!(%from, %to, "send between unlinked nodes ignored");
            return false;
        };

        self.sent += 1;
        self.state.total_messages_sent += 1;
        self.state.round_messages += 1;

        let link = &mut self.state.edges[edge.0];
        link.active = true;
        link.last_used_round = Some(round);

        let activated = self
            .state
            .node_mut(to)
            .map(|node| node.activate(round))
            .unwrap_or(false);
        if activated {
            let id = self.state.take_transfer_id();
            let now = self.state.clock_ms;
            self.state
                .transfers
                .push(Transfer::new(id, from, to, edge, round, now));
        }
        activated
    }

    /// Recompute coverage and decide whether the run is over.
    ///
    /// Stagnation and the round cap are only judged when `round_closed`;
    /// full coverage ends the run at any step.
    pub fn settle(mut self, round_closed: bool, max_rounds: u32) -> NetworkState {
        let state = &mut self.state;
        state.recompute_coverage();

        let verdict = if state.coverage >= 100.0 {
            Some(Termination::FullCoverage)
        } else if round_closed && state.round > 0 && state.round_messages == 0 {
            Some(Termination::Stagnated)
        } else if round_closed && state.round >= max_rounds {
            Some(Termination::RoundLimit)
        } else {
            None
        };

        if round_closed {
            state.round_messages = 0;
        }

        if let Some(reason) = verdict {
            state.finish(reason);
            info!(
                protocol = %state.protocol,
                round = state.round,
                coverage = state.coverage,
                messages = state.total_messages_sent,
                ?reason,
                "run complete"
            );
        }

        self.state
    }
}
