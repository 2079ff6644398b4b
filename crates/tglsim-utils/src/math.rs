//! Scalar math helpers.

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] / [`Ord::clamp`] this never panics when the bounds
/// are inverted: the lower bound wins. Settings rely on that when a derived
/// upper bound collapses below the fixed lower bound.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        if max < min {
            min
        } else {
            max
        }
    } else {
        value
    }
}

/// Linear interpolation between `a` and `b` at `t`.
///
/// `t` is not clamped; `t = 0.0` yields `a` and `t = 1.0` yields `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise [`lerp`] for 3D positions.
#[inline]
pub fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Round a non-negative real to the nearest `usize` (halves round up).
///
/// Negative and NaN inputs map to 0.
pub fn round_to_usize(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.round() as usize
    }
}
