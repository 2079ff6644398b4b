//! Building fresh networks for both protocols from one set of settings.

use rand::Rng;
use tglsim_topology::{build_flooding_topology, build_hierarchical_topology, NetworkState};
use tracing::info;

use crate::error::Result;
use crate::settings::Settings;

/// Build the flooding network described by `settings`.
pub fn build_flooding<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> Result<NetworkState> {
    Ok(build_flooding_topology(
        settings.node_count(),
        settings.average_degree(),
        settings.malicious_percentage(),
        rng,
    )?)
}

/// Build the hierarchical network described by `settings`.
pub fn build_hierarchical<R: Rng + ?Sized>(
    settings: &Settings,
    rng: &mut R,
) -> Result<NetworkState> {
    Ok(build_hierarchical_topology(
        settings.relay_count(),
        settings.leaf_count(),
        settings.push_budget(),
        settings.malicious_percentage(),
        rng,
    )?)
}

/// Discard whatever ran before and build both networks anew.
///
/// Returns `(flooding, hierarchical)`. Both draw their malicious nodes from
/// the same `rng`, flooding first.
pub fn reset<R: Rng + ?Sized>(
    settings: &Settings,
    rng: &mut R,
) -> Result<(NetworkState, NetworkState)> {
    let flooding = build_flooding(settings, rng)?;
    let hierarchical = build_hierarchical(settings, rng)?;

    info!(
        nodes = settings.node_count(),
        degree = settings.average_degree(),
        relays = settings.relay_count(),
        leaves = settings.leaf_count(),
        malicious_pct = settings.malicious_percentage(),
        "networks reset"
    );

    Ok((flooding, hierarchical))
}
