//! Shared types for the wave-grid engine.
//!
//! # Invariants
//! - Direction buckets are fixed at 16, uniformly spaced over a full turn.
//! - Every fallible engine operation reports through [`WaveError`].

pub mod direction;
pub mod error;
pub mod types;

pub use direction::{
    DIRECTIONS, bucket_angle, bucket_direction, bucket_from_fraction, fraction_from_angle,
    fraction_from_vector,
};
pub use error::WaveError;
pub use types::DisturbanceEvent;

/// Gravitational acceleration used by the deep-water dispersion relation.
pub const GRAVITY: f64 = 9.81;

pub fn crate_info() -> &'static str {
    "wavegrid-common v0.1.0"
}
