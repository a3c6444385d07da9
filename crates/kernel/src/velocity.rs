//! Per-cell, per-direction group velocity after shallow-water refraction.

use glam::Vec2;
use wavegrid_common::{DIRECTIONS, WaveError, bucket_direction};

use crate::config::RefractionParams;
use crate::environment::EnvironmentDepthField;
use crate::field::padded_len;

/// Velocities for every padded cell, fixed at construction.
#[derive(Debug, Clone)]
pub struct VelocityField {
    side: usize,
    velocity: Vec<Vec2>,
    wet: Vec<bool>,
}

impl VelocityField {
    pub fn build(
        resolution: usize,
        half_size: f32,
        group_speed: f32,
        environment: &EnvironmentDepthField,
        refraction: &RefractionParams,
    ) -> Result<Self, WaveError> {
        let cells = padded_len(resolution, 1, "wet mask")?;
        let len = padded_len(resolution, DIRECTIONS, "velocity table")?;
        let side = resolution + 2;
        let cell_size = half_size * 2.0 / resolution as f32;

        let mut velocity = Vec::new();
        velocity
            .try_reserve_exact(len)
            .map_err(|_| WaveError::ResourceAllocationFailure {
                what: "velocity table",
                bytes: len.saturating_mul(std::mem::size_of::<Vec2>()),
            })?;
        let mut wet = Vec::new();
        wet.try_reserve_exact(cells)
            .map_err(|_| WaveError::ResourceAllocationFailure {
                what: "wet mask",
                bytes: cells,
            })?;

        let directions: [Vec2; DIRECTIONS] = std::array::from_fn(bucket_direction);
        for y in 0..side {
            for x in 0..side {
                let pos = Vec2::new(
                    -half_size + (x as f32 - 0.5) * cell_size,
                    -half_size + (y as f32 - 0.5) * cell_size,
                );
                let depth = environment.depth_at(pos);
                let is_wet = depth >= 0.0;
                wet.push(is_wet);
                if !is_wet {
                    velocity.extend(std::iter::repeat_n(Vec2::ZERO, DIRECTIONS));
                    continue;
                }
                let s = refraction.speed_factor(depth);
                let gradient = if s < 1.0 {
                    environment.gradient_at(pos)
                } else {
                    Vec2::ZERO
                };
                velocity.extend(
                    directions
                        .iter()
                        .map(|&dir| refraction.bend(dir, gradient, s) * (group_speed * s)),
                );
            }
        }

        let field = Self {
            side,
            velocity,
            wet,
        };
        tracing::debug!(
            side,
            wet_fraction = field.wet_fraction(),
            "velocity table built"
        );
        Ok(field)
    }

    /// Velocity of direction `d` in padded cell `(x, y)`, world units per second.
    #[inline]
    pub fn velocity(&self, x: usize, y: usize, d: usize) -> Vec2 {
        self.velocity[(y * self.side + x) * DIRECTIONS + d]
    }

    #[inline]
    pub fn is_wet(&self, x: usize, y: usize) -> bool {
        self.wet[y * self.side + x]
    }

    pub fn wet_fraction(&self) -> f32 {
        let wet = self.wet.iter().filter(|&&w| w).count();
        wet as f32 / self.wet.len().max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_table_reports_allocation_failure() {
        let env = EnvironmentDepthField::open_water(8.0).unwrap();
        let err = VelocityField::build(
            1 << (usize::BITS / 2),
            8.0,
            1.0,
            &env,
            &RefractionParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WaveError::ResourceAllocationFailure { .. }), "{err:?}");
    }

    #[test]
    fn open_water_moves_at_group_speed() {
        let env = EnvironmentDepthField::open_water(8.0).unwrap();
        let field = VelocityField::build(8, 8.0, 2.0, &env, &RefractionParams::default()).unwrap();
        for d in 0..DIRECTIONS {
            let v = field.velocity(3, 4, d);
            assert!((v.length() - 2.0).abs() < 1e-5);
            assert!((v.normalize() - bucket_direction(d)).length() < 1e-5);
        }
        assert_eq!(field.wet_fraction(), 1.0);
    }

    #[test]
    fn dry_cells_are_frozen() {
        // Left half land, right half water; map cells coincide with grid cells.
        let depths = (0..16).map(|i| if i % 4 < 2 { -5.0 } else { 10.0 }).collect();
        let env = EnvironmentDepthField::from_depths(4.0, depths).unwrap();
        let field = VelocityField::build(4, 4.0, 1.0, &env, &RefractionParams::default()).unwrap();
        assert!(!field.is_wet(1, 2));
        assert!(field.is_wet(4, 2));
        assert_eq!(field.velocity(1, 2, 0), Vec2::ZERO);
    }

    #[test]
    fn shallow_water_slows_waves() {
        let env = EnvironmentDepthField::from_depths(4.0, vec![1.0; 4]).unwrap();
        let refraction = RefractionParams::default();
        let field = VelocityField::build(4, 4.0, 1.0, &env, &refraction).unwrap();
        let expected = refraction.speed_factor(1.0);
        assert!((field.velocity(2, 2, 5).length() - expected).abs() < 1e-5);
    }
}
