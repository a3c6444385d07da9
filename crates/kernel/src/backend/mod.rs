//! Compute backends for the per-tick field passes.
//!
//! Every backend runs the same row kernels from [`kernels`], so results are
//! bit-identical regardless of which one drives a grid.

mod kernels;
mod parallel;
mod sequential;

use std::fmt;

pub use parallel::ParallelBackend;
pub use sequential::SequentialBackend;

use wavegrid_spectrum::ProfileBuffer;

use crate::config::{BackendKind, DiffusionKernel};
use crate::field::AmplitudeField;
use crate::velocity::VelocityField;

/// Executes the field passes. Each pass reads `src` and overwrites the
/// interior of `dst`; padding cells of `dst` are left untouched.
pub trait GridBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Rows per work unit.
    fn tile_size(&self) -> usize;

    /// Semi-Lagrangian transport: `scale` converts velocity to cells per tick.
    fn advect(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        scale: f32,
        dst: &mut AmplitudeField,
    );

    fn diffuse(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        kernel: &DiffusionKernel,
        dst: &mut AmplitudeField,
    );

    fn dissipate(&self, src: &AmplitudeField, factor: f32, dst: &mut AmplitudeField);

    /// `dst = max(ambient + disturbance, 0)`.
    fn merge(
        &self,
        ambient: &AmplitudeField,
        disturbance: &AmplitudeField,
        dst: &mut AmplitudeField,
    );

    /// Re-phase a profile buffer to simulation time `time`.
    fn precompute_profile(&self, profile: &mut ProfileBuffer, time: f64);

    fn update_edges(&self, field: &mut AmplitudeField) {
        field.refresh_border();
    }
}

pub fn create(kind: BackendKind) -> Box<dyn GridBackend> {
    match kind {
        BackendKind::Sequential => Box::new(SequentialBackend),
        BackendKind::Parallel => Box::new(ParallelBackend::default()),
    }
}
