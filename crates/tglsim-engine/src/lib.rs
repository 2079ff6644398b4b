//! TGL Simulator Engine - Flooding vs. Three-Stage Dissemination
//!
//! This crate advances the two networks built by [`tglsim_topology`]:
//!
//! - **Flooding ("P2P")**: [`advance_round`] runs one epidemic round where
//!   every active node contacts a mix of Idle and already covered neighbors.
//! - **Hierarchical ("TGL")**: [`advance_stage`] runs one of Push, Gossip or
//!   Pull; three stages make a round.
//! - **Transfers**: [`tick_transfers`] moves in-flight messages along their
//!   edges as simulated time passes. A scheduler should only advance a
//!   network once its transfers have drained.
//!
//! Every operation takes a snapshot by reference and returns a new one, so
//! callers can keep any history they like. All randomness comes from the
//! `rng` argument; a seeded [`rand::rngs::StdRng`] makes runs reproducible.
//!
//! # Example
//!
//! ```rust,ignore
//! use rand::{rngs::StdRng, SeedableRng};
//! use tglsim_engine::{reset, Engine, Settings};
//!
//! let settings = Settings::default();
//! let mut rng = StdRng::seed_from_u64(42);
//! let engine = Engine::from_settings(&settings);
//! let (mut flood, mut tgl) = reset(&settings, &mut rng)?;
//!
//! while !flood.is_complete {
//!     flood = engine.advance(&flood, &mut rng);
//! }
//! while !tgl.is_complete {
//!     tgl = engine.advance(&tgl, &mut rng);
//! }
//! ```

pub mod error;
pub mod fault;
pub mod flooding;
pub mod hierarchical;
pub mod reset;
pub mod settings;
mod step;
pub mod transfers;

pub use error::{Error, Result};
pub use fault::{Cooperative, DropMalicious, FaultModel};
pub use flooding::{advance_round, contact_split, FloodingParams};
pub use hierarchical::{advance_stage, StageBudgets};
pub use reset::{build_flooding, build_hierarchical, reset};
pub use settings::Settings;
pub use transfers::tick_transfers;

use rand::Rng;
use tglsim_topology::{NetworkState, Protocol};

/// Both protocols behind one entry point, with parameters taken from
/// [`Settings`].
#[derive(Debug, Clone)]
pub struct Engine<F = DropMalicious> {
    flooding: FloodingParams,
    budgets: StageBudgets,
    transfer_duration_ms: f64,
    faults: F,
}

impl Engine<DropMalicious> {
    /// Engine where malicious nodes drop everything.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_faults(settings, DropMalicious)
    }
}

impl<F: FaultModel> Engine<F> {
    pub fn with_faults(settings: &Settings, faults: F) -> Self {
        Self {
            flooding: FloodingParams::from(settings),
            budgets: StageBudgets::from(settings),
            transfer_duration_ms: settings.transfer_duration_ms(),
            faults,
        }
    }

    pub fn flooding_params(&self) -> &FloodingParams {
        &self.flooding
    }

    pub fn budgets(&self) -> &StageBudgets {
        &self.budgets
    }

    pub fn transfer_duration_ms(&self) -> f64 {
        self.transfer_duration_ms
    }

    /// One flooding round or one TGL stage, depending on the network.
    pub fn advance<R: Rng + ?Sized>(&self, state: &NetworkState, rng: &mut R) -> NetworkState {
        match state.protocol {
            Protocol::Flooding => advance_round(state, &self.flooding, &self.faults, rng),
            Protocol::Hierarchical => advance_stage(state, &self.budgets, &self.faults, rng),
        }
    }

    pub fn tick(&self, state: &NetworkState, delta_ms: f64) -> NetworkState {
        tick_transfers(state, delta_ms, self.transfer_duration_ms)
    }

    /// Advance and drain transfers until the run completes.
    ///
    /// Bounded by the round cap: every advance either sends something or
    /// ends the run by stagnation.
    pub fn run_to_completion<R: Rng + ?Sized>(
        &self,
        state: &NetworkState,
        rng: &mut R,
    ) -> NetworkState {
        let mut current = state.clone();
        while !current.is_complete {
            current = self.advance(&current, rng);
            while current.has_transfers_in_flight() {
                current = self.tick(&current, self.transfer_duration_ms);
            }
        }
        current
    }
}
