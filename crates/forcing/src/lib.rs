//! Directional forcing: spreads the wind's wave amplitude over the two
//! direction buckets that straddle the wind direction in grid space.
//!
//! # Invariants
//! - At most two entries of the amplitude vector are non-zero.
//! - Non-zero entries sum to the wave amplitude.

mod forcing;

pub use forcing::{DirectionalAmplitude, ForcingCache, WindSettings, default_amplitude};

pub fn crate_info() -> &'static str {
    "wavegrid-forcing v0.1.0"
}
