//! Error types for tglsim-engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for tglsim-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up a run.
///
/// Advancing and ticking never fail; only building networks and loading
/// settings do.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings describe a graph that cannot be built.
    #[error("topology error: {0}")]
    Topology(#[from] tglsim_topology::TopologyError),

    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`](crate::Settings).
    #[error("invalid settings file: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
