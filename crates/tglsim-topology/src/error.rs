//! Error types for tglsim-topology.

use thiserror::Error;

/// Result type for topology construction.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Reasons a requested topology cannot be built.
///
/// Builders validate their inputs before allocating anything, so a returned
/// [`NetworkState`](crate::NetworkState) is always well formed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    /// A ring needs at least two nodes.
    #[error("topology needs at least {min} nodes, got {actual}")]
    TooFewNodes { min: usize, actual: usize },

    /// Degree below the ring minimum of 2.
    #[error("degree {degree} is below the minimum of 2")]
    DegreeTooSmall { degree: usize },

    /// Degree would require self-loops or duplicate links.
    #[error("degree {degree} must be at most node_count - 1 ({max}) for {node_count} nodes")]
    DegreeTooLarge {
        degree: usize,
        node_count: usize,
        max: usize,
    },

    /// The TGL core needs at least one relay.
    #[error("hierarchical topology needs at least one relay")]
    NoRelays,

    /// The TGL edge needs at least one leaf (the source is a leaf).
    #[error("hierarchical topology needs at least one leaf")]
    NoLeaves,

    /// Leaves connect to `min(relays, push_budget)` relays, so 0 would isolate them.
    #[error("push budget must be at least 1")]
    ZeroPushBudget,

    /// Percentages live in [0, 100].
    #[error("percentage {0} is outside [0, 100]")]
    InvalidPercentage(f64),
}

/// Reject NaN and anything outside `[0, 100]`.
pub(crate) fn check_percentage(value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(TopologyError::InvalidPercentage(value))
    }
}
