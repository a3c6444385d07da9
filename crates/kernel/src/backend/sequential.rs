use wavegrid_spectrum::ProfileBuffer;

use super::GridBackend;
use super::kernels::{advect_row, diffuse_row, dissipate_row, merge_row};
use crate::config::DiffusionKernel;
use crate::field::AmplitudeField;
use crate::velocity::VelocityField;

/// Single-threaded reference backend; profile synthesis also stays on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialBackend;

fn for_each_row(dst: &mut AmplitudeField, mut f: impl FnMut(usize, &mut [f32])) {
    let row_len = dst.row_len();
    for (y, row) in dst.as_mut_slice().chunks_mut(row_len).enumerate() {
        f(y, row);
    }
}

impl GridBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn tile_size(&self) -> usize {
        1
    }

    fn advect(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        scale: f32,
        dst: &mut AmplitudeField,
    ) {
        for_each_row(dst, |y, row| advect_row(src, flow, scale, y, row));
    }

    fn diffuse(
        &self,
        src: &AmplitudeField,
        flow: &VelocityField,
        kernel: &DiffusionKernel,
        dst: &mut AmplitudeField,
    ) {
        for_each_row(dst, |y, row| diffuse_row(src, flow, kernel, y, row));
    }

    fn dissipate(&self, src: &AmplitudeField, factor: f32, dst: &mut AmplitudeField) {
        for_each_row(dst, |y, row| dissipate_row(src, factor, y, row));
    }

    fn merge(
        &self,
        ambient: &AmplitudeField,
        disturbance: &AmplitudeField,
        dst: &mut AmplitudeField,
    ) {
        for_each_row(dst, |y, row| merge_row(ambient, disturbance, y, row));
    }

    fn precompute_profile(&self, profile: &mut ProfileBuffer, time: f64) {
        profile.precompute_sequential(time);
    }
}
