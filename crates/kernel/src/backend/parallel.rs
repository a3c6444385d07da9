use rayon::prelude::*;
use wavegrid_spectrum::ProfileBuffer;

use super::GridBackend;
use super::kernels::{advect_row, diffuse_row, dissipate_row, merge_row};
use crate::config::{BackendKind, DiffusionKernel};
use crate::field::AmplitudeField;
use crate::velocity::VelocityField;

/// Rayon backend: blocks of `tile` padded rows are processed in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ParallelBackend {
    tile: usize,
}

impl ParallelBackend {
    pub fn new(tile: usize) -> Self {
        Self { tile: tile.max(1) }
    }
}

impl Default for ParallelBackend {
    fn default() -> Self {
        Self::new(BackendKind::Parallel.tile_size())
    }
}

impl ParallelBackend {
    fn for_each_row<F>(&self, dst: &mut AmplitudeField, f: F)
    where
        F: Fn(usize, &mut [f32]) + Sync,
    {
        let row_len = dst.row_len();
        let tile = self.tile;
        dst.as_mut_slice()
            .par_chunks_mut(row_len * tile)
            .enumerate()
            .for_each(|(block, rows)| {
                for (i, row) in rows.chunks_mut(row_len).enumerate() {
                    f(block * tile + i, row);
                }
            });
    }
}

impl GridBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn tile_size(&self) -> usize {
        self.tile
    }

    fn advect(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        scale: f32,
        dst: &mut AmplitudeField,
    ) {
        self.for_each_row(dst, |y, row| advect_row(src, flow, scale, y, row));
    }

    fn diffuse(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        kernel: &DiffusionKernel,
        dst: &mut AmplitudeField,
    ) {
        self.for_each_row(dst, |y, row| diffuse_row(src, flow, kernel, y, row));
    }

    fn dissipate(&self, src: &AmplitudeField, factor: f32, dst: &mut AmplitudeField) {
        self.for_each_row(dst, |y, row| dissipate_row(src, factor, y, row));
    }

    fn merge(
        &self,
        ambient: &AmplitudeField,
        disturbance: &AmplitudeField,
        dst: &mut AmplitudeField,
    ) {
        self.for_each_row(dst, |y, row| merge_row(ambient, disturbance, y, row));
    }

    fn precompute_profile(&self, profile: &mut ProfileBuffer, time: f64) {
        profile.precompute(time);
    }
}
