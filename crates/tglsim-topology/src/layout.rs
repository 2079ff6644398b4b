//! 3D layout positions.
//!
//! Positions only matter to whoever paints the network. They are computed
//! deterministically from indices so two builds of the same topology look
//! the same regardless of the random seed.

use std::f32::consts::TAU;

/// Radius of the sphere the flooding ring is wrapped around.
pub const FLOODING_RADIUS: f32 = 10.0;

/// Radius of the TGL relay core.
pub const RELAY_RADIUS: f32 = 4.0;

/// Radius of the TGL leaf shell.
pub const LEAF_RADIUS: f32 = 10.0;

/// Golden angle in radians, used by the Fibonacci sphere.
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// `count` points spread evenly over a sphere (Fibonacci lattice).
///
/// Consecutive indices stay close together, so ring neighbours are also
/// visual neighbours.
pub fn sphere(count: usize, radius: f32) -> Vec<[f32; 3]> {
    if count == 1 {
        return vec![[0.0, 0.0, 0.0]];
    }
    (0..count)
        .map(|i| {
            // y runs from +1 to -1
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = GOLDEN_ANGLE * i as f32;
            [radius * r * theta.cos(), radius * y, radius * r * theta.sin()]
        })
        .collect()
}

/// `count` points spaced evenly on a horizontal circle at height `z`.
pub fn circle(count: usize, radius: f32, z: f32) -> Vec<[f32; 3]> {
    if count == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            [radius * angle.cos(), radius * angle.sin(), z]
        })
        .collect()
}
