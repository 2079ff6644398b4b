//! Transfer progress: moves in-flight messages along their edges as
//! simulated time passes.

use tglsim_topology::{NetworkState, TransferState};
use tracing::{trace, warn};

/// Advance every in-flight transfer by `delta_ms` and drop the ones that
/// finished.
///
/// The simulated clock always moves forward by `delta_ms`, even when nothing
/// is in flight. A transfer whose endpoints no longer exist is failed and
/// dropped. Negative or non-finite deltas are treated as zero.
pub fn tick_transfers(state: &NetworkState, delta_ms: f64, duration_ms: f64) -> NetworkState {
    let mut next = state.clone();
    let delta = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
    let started_at = next.clock_ms;
    next.clock_ms += delta;

    if next.transfers.is_empty() {
        return next;
    }

    let step = if duration_ms > 0.0 {
        (delta / duration_ms) as f32
    } else {
        1.0
    };
    let node_count = next.nodes.len();
    let now = next.clock_ms;

    for transfer in &mut next.transfers {
        if transfer.source.index() >= node_count || transfer.target.index() >= node_count {
            warn!(id = transfer.id.0, source = %transfer.source, target = %transfer.target, "transfer endpoint missing");
            transfer.state = TransferState::Failed;
            continue;
        }

        if transfer.state == TransferState::Pending {
            transfer.state = TransferState::InProgress;
            transfer.start_time_ms = started_at;
        }
        if transfer.state != TransferState::InProgress {
            continue;
        }

        transfer.progress = (transfer.progress + step).clamp(0.0, 1.0);
        if transfer.arrived() {
            transfer.state = TransferState::Completed;
            transfer.end_time_ms = Some(now);
        }
    }

    let before = next.transfers.len();
    next.transfers.retain(|t| t.in_flight());
    trace!(
        finished = before - next.transfers.len(),
        remaining = next.transfers.len(),
        clock_ms = now,
        "ticked transfers"
    );

    next
}
