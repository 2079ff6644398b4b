//! TGL Simulator Utilities
//!
//! Small, stateless helpers used by the topology builders and the
//! propagation engine.
//!
//! # Randomness
//!
//! Nothing in this crate owns a random source. Every function that needs
//! randomness takes `&mut R where R: Rng + ?Sized`, so callers can thread a
//! single seeded generator through a whole run and get reproducible results.

mod math;
mod sampling;

pub use math::{clamp, lerp, lerp3, round_to_usize};
pub use sampling::{dedup, random_int, sample, shuffle};
