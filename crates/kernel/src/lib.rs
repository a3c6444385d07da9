//! Wave Grid: per-cell directional wave energy, transported by group velocity.
//!
//! # Invariants
//! - Interior amplitudes of the merged output are non-negative after every tick.
//! - Padding cells of the output equal their nearest interior cell after every tick.
//! - A tick either fails before mutating anything or runs every pass to completion.
//! - All backends produce bit-identical fields for identical inputs.

pub mod backend;
pub mod config;
pub mod disturbance;
pub mod environment;
pub mod field;
pub mod grid;
pub mod velocity;

pub use backend::{GridBackend, ParallelBackend, SequentialBackend};
pub use config::{BackendKind, DiffusionKernel, GridConfig, MIN_RESOLUTION, RefractionParams};
pub use disturbance::DisturbanceSender;
pub use environment::{EnvironmentDepthField, OPEN_WATER_DEPTH};
pub use field::AmplitudeField;
pub use grid::{GridState, TickInput, TickStats, WaveGrid};
pub use velocity::VelocityField;

pub fn crate_info() -> &'static str {
    "wavegrid-kernel v0.1.0"
}
