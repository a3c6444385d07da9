//! Row kernels shared by all backends. `y` is the padded row index and `row`
//! the matching slice of the destination field.

use wavegrid_common::DIRECTIONS;

use crate::config::DiffusionKernel;
use crate::field::AmplitudeField;
use crate::velocity::VelocityField;

#[inline]
fn is_interior_row(src: &AmplitudeField, y: usize) -> bool {
    y >= 1 && y <= src.resolution()
}

pub(crate) fn advect_row(
    src: &AmplitudeField,
    flow: &VelocityField,
    scale: f32,
    y: usize,
    row: &mut [f32],
) {
    if !is_interior_row(src, y) {
        return;
    }
    for x in 1..=src.resolution() {
        let cell = &mut row[x * DIRECTIONS..(x + 1) * DIRECTIONS];
        if !flow.is_wet(x, y) {
            cell.fill(0.0);
            continue;
        }
        for (d, out) in cell.iter_mut().enumerate() {
            let v = flow.velocity(x, y, d) * scale;
            *out = src.sample(x as f32 - v.x, y as f32 - v.y, d);
        }
    }
}

pub(crate) fn diffuse_row(
    src: &AmplitudeField,
    flow: &VelocityField,
    kernel: &DiffusionKernel,
    y: usize,
    row: &mut [f32],
) {
    if !is_interior_row(src, y) {
        return;
    }
    let n = src.resolution();
    for x in 1..=n {
        let cell = &mut row[x * DIRECTIONS..(x + 1) * DIRECTIONS];
        if !flow.is_wet(x, y) {
            cell.fill(0.0);
            continue;
        }
        // Dry or out-of-grid neighbours mirror the centre (zero flux).
        let neighbour = |nx: usize, ny: usize, d: usize, c: f32| {
            if (1..=n).contains(&nx) && (1..=n).contains(&ny) && flow.is_wet(nx, ny) {
                src.get(nx, ny, d)
            } else {
                c
            }
        };
        for (d, out) in cell.iter_mut().enumerate() {
            let c = src.get(x, y, d);
            let spatial = neighbour(x - 1, y, d, c)
                + neighbour(x + 1, y, d, c)
                + neighbour(x, y - 1, d, c)
                + neighbour(x, y + 1, d, c)
                - 4.0 * c;
            let left = src.get(x, y, (d + DIRECTIONS - 1) % DIRECTIONS);
            let right = src.get(x, y, (d + 1) % DIRECTIONS);
            let angular = left + right - 2.0 * c;
            *out = c + kernel.spatial * spatial + kernel.angular * angular;
        }
    }
}

pub(crate) fn dissipate_row(src: &AmplitudeField, factor: f32, y: usize, row: &mut [f32]) {
    if !is_interior_row(src, y) {
        return;
    }
    let n = src.resolution();
    let start = src.index(1, y, 0);
    let len = n * DIRECTIONS;
    let input = &src.as_slice()[start..start + len];
    for (out, a) in row[DIRECTIONS..DIRECTIONS + len].iter_mut().zip(input) {
        *out = a * factor;
    }
}

pub(crate) fn merge_row(
    ambient: &AmplitudeField,
    disturbance: &AmplitudeField,
    y: usize,
    row: &mut [f32],
) {
    if !is_interior_row(ambient, y) {
        return;
    }
    let start = ambient.index(1, y, 0);
    let len = ambient.resolution() * DIRECTIONS;
    let a = &ambient.as_slice()[start..start + len];
    let b = &disturbance.as_slice()[start..start + len];
    for ((out, a), b) in row[DIRECTIONS..DIRECTIONS + len].iter_mut().zip(a).zip(b) {
        *out = (a + b).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefractionParams;
    use crate::environment::EnvironmentDepthField;

    fn still_flow(resolution: usize) -> VelocityField {
        let env = EnvironmentDepthField::open_water(resolution as f32).unwrap();
        VelocityField::build(resolution, resolution as f32, 1.0, &env, &RefractionParams::default())
            .unwrap()
    }

    fn run_rows(dst: &mut AmplitudeField, mut f: impl FnMut(usize, &mut [f32])) {
        let row_len = dst.row_len();
        for (y, row) in dst.as_mut_slice().chunks_mut(row_len).enumerate() {
            f(y, row);
        }
    }

    #[test]
    fn zero_scale_advection_is_identity() {
        let flow = still_flow(4);
        let mut src = AmplitudeField::new(4).unwrap();
        src.set(2, 3, 7, 1.5);
        let mut dst = AmplitudeField::new(4).unwrap();
        run_rows(&mut dst, |y, row| advect_row(&src, &flow, 0.0, y, row));
        assert_eq!(dst.get(2, 3, 7), 1.5);
        assert_eq!(dst.total(), 1.5);
    }

    #[test]
    fn unit_step_shifts_along_bucket() {
        let flow = still_flow(8);
        let mut src = AmplitudeField::new(8).unwrap();
        src.set(4, 4, 0, 1.0);
        let mut dst = AmplitudeField::new(8).unwrap();
        run_rows(&mut dst, |y, row| advect_row(&src, &flow, 1.0, y, row));
        // Bucket 0 travels mostly +x: mass appears downstream of (4, 4).
        assert!(dst.get(5, 4, 0) > 0.5);
        assert!((dst.total() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn diffusion_preserves_uniform_field() {
        let flow = still_flow(4);
        let mut src = AmplitudeField::new(4).unwrap();
        for y in 1..=4 {
            for x in 1..=4 {
                for d in 0..DIRECTIONS {
                    src.set(x, y, d, 2.0);
                }
            }
        }
        let mut dst = AmplitudeField::new(4).unwrap();
        let kernel = DiffusionKernel::default();
        run_rows(&mut dst, |y, row| diffuse_row(&src, &flow, &kernel, y, row));
        for y in 1..=4 {
            for x in 1..=4 {
                assert!(dst.cell(x, y).iter().all(|&a| (a - 2.0).abs() < 1e-6));
            }
        }
    }

    #[test]
    fn diffusion_conserves_and_spreads_a_spike() {
        let flow = still_flow(8);
        let mut src = AmplitudeField::new(8).unwrap();
        src.set(4, 4, 3, 1.0);
        let mut dst = AmplitudeField::new(8).unwrap();
        let kernel = DiffusionKernel::default();
        run_rows(&mut dst, |y, row| diffuse_row(&src, &flow, &kernel, y, row));
        assert!((dst.total() - 1.0).abs() < 1e-6);
        assert!(dst.get(4, 4, 3) < 1.0);
        assert!(dst.get(5, 4, 3) > 0.0);
        assert!(dst.get(4, 4, 2) > 0.0);
        assert!(dst.get(4, 4, 4) > 0.0);
        assert!(dst.as_slice().iter().all(|&a| a >= 0.0));
    }

    #[test]
    fn dissipate_and_merge_touch_interior_only() {
        let mut a = AmplitudeField::new(4).unwrap();
        a.fill_border(&[9.0; DIRECTIONS]);
        a.set(1, 1, 0, 2.0);
        let mut b = AmplitudeField::new(4).unwrap();
        b.set(1, 1, 0, -3.0);
        b.set(2, 1, 0, 1.0);

        let mut out = AmplitudeField::new(4).unwrap();
        run_rows(&mut out, |y, row| dissipate_row(&a, 0.5, y, row));
        assert_eq!(out.get(1, 1, 0), 1.0);
        assert_eq!(out.get(0, 0, 0), 0.0);

        let mut merged = AmplitudeField::new(4).unwrap();
        run_rows(&mut merged, |y, row| merge_row(&a, &b, y, row));
        assert_eq!(merged.get(1, 1, 0), 0.0);
        assert_eq!(merged.get(2, 1, 0), 1.0);
        assert_eq!(merged.get(0, 1, 0), 0.0);
    }
}
