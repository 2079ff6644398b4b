//! Validated simulation settings.
//!
//! Every setter clamps its input into the documented range and re-derives
//! dependent fields, so a `Settings` value is always consistent:
//!
//! - `average_degree` stays within `[2, node_count - 1]`
//! - `leaf_percentage == 100 - relay_percentage`
//!
//! Out-of-range input is never an error; clamping is the recovery.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tglsim_utils::{clamp, round_to_usize};

use crate::error::{Error, Result};

pub const NODE_COUNT_RANGE: RangeInclusive<usize> = 10..=100;
pub const MIN_DEGREE: usize = 2;
pub const PERCENT_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const BUDGET_RANGE: RangeInclusive<usize> = 1..=10;
pub const ROUND_DELAY_RANGE: RangeInclusive<u64> = 50..=5000;
pub const MAX_ROUNDS_RANGE: RangeInclusive<u32> = 10..=1000;
pub const USEFUL_FRACTION_RANGE: RangeInclusive<f64> = 0.05..=1.0;
pub const TRANSFER_DURATION_RANGE: RangeInclusive<f64> = 10.0..=5000.0;

/// Clamp a float, mapping NaN to the lower bound.
fn clamp_f64(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        *range.start()
    } else {
        clamp(value, *range.start(), *range.end())
    }
}

/// Configuration shared by both protocol runs.
///
/// Deserialization goes through the setters, so JSON input is clamped the
/// same way as values set in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSettings")]
pub struct Settings {
    node_count: usize,
    average_degree: usize,
    relay_percentage: f64,
    leaf_percentage: f64,
    push_budget: usize,
    gossip_budget: usize,
    pull_budget: usize,
    round_delay_ms: u64,
    max_rounds: u32,
    malicious_percentage: f64,
    useful_fraction: f64,
    transfer_duration_ms: f64,
    seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_count: 30,
            average_degree: 4,
            relay_percentage: 20.0,
            leaf_percentage: 80.0,
            push_budget: 2,
            gossip_budget: 3,
            pull_budget: 4,
            round_delay_ms: 800,
            max_rounds: 50,
            malicious_percentage: 0.0,
            useful_fraction: 1.0 / 3.0,
            transfer_duration_ms: 400.0,
            seed: None,
        }
    }
}

/// Settings exactly as written in a file, before clamping.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSettings {
    node_count: usize,
    average_degree: usize,
    relay_percentage: f64,
    push_budget: usize,
    gossip_budget: usize,
    pull_budget: usize,
    round_delay_ms: u64,
    max_rounds: u32,
    malicious_percentage: f64,
    useful_fraction: f64,
    transfer_duration_ms: f64,
    seed: Option<u64>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Settings::default().into()
    }
}

impl From<Settings> for RawSettings {
    fn from(s: Settings) -> Self {
        Self {
            node_count: s.node_count,
            average_degree: s.average_degree,
            relay_percentage: s.relay_percentage,
            push_budget: s.push_budget,
            gossip_budget: s.gossip_budget,
            pull_budget: s.pull_budget,
            round_delay_ms: s.round_delay_ms,
            max_rounds: s.max_rounds,
            malicious_percentage: s.malicious_percentage,
            useful_fraction: s.useful_fraction,
            transfer_duration_ms: s.transfer_duration_ms,
            seed: s.seed,
        }
    }
}

/// An explicit `leaf_percentage` is ignored in favour of `relay_percentage`.
impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let mut s = Settings::default();
        s.set_node_count(raw.node_count);
        s.set_average_degree(raw.average_degree);
        s.set_relay_percentage(raw.relay_percentage);
        s.set_push_budget(raw.push_budget);
        s.set_gossip_budget(raw.gossip_budget);
        s.set_pull_budget(raw.pull_budget);
        s.set_round_delay_ms(raw.round_delay_ms);
        s.set_max_rounds(raw.max_rounds);
        s.set_malicious_percentage(raw.malicious_percentage);
        s.set_useful_fraction(raw.useful_fraction);
        s.set_transfer_duration_ms(raw.transfer_duration_ms);
        s.set_seed(raw.seed);
        s
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults and
    /// every value is clamped as if set through the setters.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Re-apply every setter so the invariants hold.
    #[must_use]
    pub fn sanitized(self) -> Self {
        RawSettings::from(self).into()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn average_degree(&self) -> usize {
        self.average_degree
    }

    pub fn relay_percentage(&self) -> f64 {
        self.relay_percentage
    }

    pub fn leaf_percentage(&self) -> f64 {
        self.leaf_percentage
    }

    pub fn push_budget(&self) -> usize {
        self.push_budget
    }

    pub fn gossip_budget(&self) -> usize {
        self.gossip_budget
    }

    pub fn pull_budget(&self) -> usize {
        self.pull_budget
    }

    pub fn round_delay_ms(&self) -> u64 {
        self.round_delay_ms
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn malicious_percentage(&self) -> f64 {
        self.malicious_percentage
    }

    /// Share of a flooding node's per-round contacts reserved for Idle
    /// neighbors; the rest model redundant gossip.
    pub fn useful_fraction(&self) -> f64 {
        self.useful_fraction
    }

    /// Simulated time for one transfer to cross its edge.
    pub fn transfer_duration_ms(&self) -> f64 {
        self.transfer_duration_ms
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Relays in the TGL network: `round(n × relay%)`, at least 1 and
    /// leaving at least one leaf.
    pub fn relay_count(&self) -> usize {
        let raw = round_to_usize(self.node_count as f64 * self.relay_percentage / 100.0);
        clamp(raw, 1, self.node_count - 1)
    }

    pub fn leaf_count(&self) -> usize {
        self.node_count - self.relay_count()
    }

    /// Changing the node count re-clamps the degree to the new maximum.
    pub fn set_node_count(&mut self, value: usize) {
        self.node_count = clamp(value, *NODE_COUNT_RANGE.start(), *NODE_COUNT_RANGE.end());
        self.average_degree = clamp(self.average_degree, MIN_DEGREE, self.node_count - 1);
    }

    pub fn set_average_degree(&mut self, value: usize) {
        self.average_degree = clamp(value, MIN_DEGREE, self.node_count - 1);
    }

    pub fn set_relay_percentage(&mut self, value: f64) {
        self.relay_percentage = clamp_f64(value, &PERCENT_RANGE);
        self.leaf_percentage = 100.0 - self.relay_percentage;
    }

    pub fn set_leaf_percentage(&mut self, value: f64) {
        self.leaf_percentage = clamp_f64(value, &PERCENT_RANGE);
        self.relay_percentage = 100.0 - self.leaf_percentage;
    }

    pub fn set_push_budget(&mut self, value: usize) {
        self.push_budget = clamp(value, *BUDGET_RANGE.start(), *BUDGET_RANGE.end());
    }

    pub fn set_gossip_budget(&mut self, value: usize) {
        self.gossip_budget = clamp(value, *BUDGET_RANGE.start(), *BUDGET_RANGE.end());
    }

    pub fn set_pull_budget(&mut self, value: usize) {
        self.pull_budget = clamp(value, *BUDGET_RANGE.start(), *BUDGET_RANGE.end());
    }

    pub fn set_round_delay_ms(&mut self, value: u64) {
        self.round_delay_ms = clamp(value, *ROUND_DELAY_RANGE.start(), *ROUND_DELAY_RANGE.end());
    }

    pub fn set_max_rounds(&mut self, value: u32) {
        self.max_rounds = clamp(value, *MAX_ROUNDS_RANGE.start(), *MAX_ROUNDS_RANGE.end());
    }

    pub fn set_malicious_percentage(&mut self, value: f64) {
        self.malicious_percentage = clamp_f64(value, &PERCENT_RANGE);
    }

    pub fn set_useful_fraction(&mut self, value: f64) {
        self.useful_fraction = clamp_f64(value, &USEFUL_FRACTION_RANGE);
    }

    pub fn set_transfer_duration_ms(&mut self, value: f64) {
        self.transfer_duration_ms = clamp_f64(value, &TRANSFER_DURATION_RANGE);
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}
