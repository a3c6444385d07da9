//! Direction-bucket math shared by forcing, injection and advection.
//!
//! Bucket `b` covers the angular sector `[b, b+1) * 2π/16` and travels along
//! the sector centre `(b + 0.5) * 2π/16`, measured counter-clockwise from +x.

use glam::Vec2;
use std::f32::consts::TAU;

/// Number of fixed compass buckets.
pub const DIRECTIONS: usize = 16;

/// Angular spacing between bucket centres, in radians.
pub const BUCKET_SPACING: f32 = TAU / DIRECTIONS as f32;

/// Travel angle (radians) of bucket `b`.
pub fn bucket_angle(b: usize) -> f32 {
    (b as f32 + 0.5) * BUCKET_SPACING
}

/// Unit travel vector of bucket `b`.
pub fn bucket_direction(b: usize) -> Vec2 {
    Vec2::from_angle(bucket_angle(b))
}

/// Nearest bucket for a direction fraction in `[0, 1]` (1.0 wraps to bucket 0).
pub fn bucket_from_fraction(fraction: f32) -> usize {
    let scaled = (fraction.rem_euclid(1.0) * DIRECTIONS as f32).floor() as usize;
    scaled % DIRECTIONS
}

/// Direction fraction in `[0, 1)` for an angle in radians.
pub fn fraction_from_angle(angle: f32) -> f32 {
    (angle / TAU).rem_euclid(1.0)
}

/// Direction fraction for a travel vector. Returns `None` for a zero vector.
pub fn fraction_from_vector(dir: Vec2) -> Option<f32> {
    if dir.length_squared() <= f32::EPSILON || !dir.is_finite() {
        return None;
    }
    Some(fraction_from_angle(dir.y.atan2(dir.x)))
}
