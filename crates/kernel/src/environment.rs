//! Static water-depth map sampled by the velocity table.

use glam::Vec2;
use wavegrid_common::WaveError;

/// Depth reported outside the mapped area.
pub const OPEN_WATER_DEPTH: f32 = 100.0;

/// Square depth map covering `[-half_size, half_size]²`.
///
/// Samples are cell-centred, stored row-major as `depths[y * side + x]`.
/// Negative depth means dry land.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDepthField {
    half_size: f32,
    side: usize,
    depths: Vec<f32>,
    gradients: Vec<Vec2>,
}

impl EnvironmentDepthField {
    pub fn from_depths(half_size: f32, depths: Vec<f32>) -> Result<Self, WaveError> {
        if !(half_size.is_finite() && half_size > 0.0) {
            return Err(WaveError::config("environment half_size must be > 0"));
        }
        let side = (depths.len() as f64).sqrt() as usize;
        if side < 2 || side * side != depths.len() {
            return Err(WaveError::config(format!(
                "environment needs a square depth map of side >= 2, got {} samples",
                depths.len()
            )));
        }
        if let Some(i) = depths.iter().position(|d| !d.is_finite()) {
            return Err(WaveError::config(format!(
                "environment depth at sample {i} is not finite"
            )));
        }

        let mut gradients = vec![Vec2::ZERO; side * side];
        for y in 0..side - 1 {
            for x in 0..side - 1 {
                let h = depths[y * side + x];
                let dx = depths[y * side + x + 1] - h;
                let dy = depths[(y + 1) * side + x] - h;
                gradients[y * side + x] = Vec2::new(dx, dy).normalize_or_zero();
            }
        }

        Ok(Self {
            half_size,
            side,
            depths,
            gradients,
        })
    }

    /// Depths from a terrain height map and a flat water level.
    pub fn from_terrain(
        half_size: f32,
        heights: &[f32],
        water_level: f32,
    ) -> Result<Self, WaveError> {
        let depths = heights.iter().map(|h| water_level - h).collect();
        Self::from_depths(half_size, depths)
    }

    /// Uniformly deep domain with no land.
    pub fn open_water(half_size: f32) -> Result<Self, WaveError> {
        Self::from_depths(half_size, vec![OPEN_WATER_DEPTH; 4])
    }

    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Bilinear depth at world position `pos`.
    pub fn depth_at(&self, pos: Vec2) -> f32 {
        self.bilinear(pos, OPEN_WATER_DEPTH, |i| self.depths[i])
    }

    /// Unit direction of increasing depth at `pos`, or zero on flat ground.
    pub fn gradient_at(&self, pos: Vec2) -> Vec2 {
        let x = self.bilinear(pos, 0.0, |i| self.gradients[i].x);
        let y = self.bilinear(pos, 0.0, |i| self.gradients[i].y);
        Vec2::new(x, y).normalize_or_zero()
    }

    /// Water covers `pos`.
    pub fn in_domain(&self, pos: Vec2) -> bool {
        self.depth_at(pos) >= 0.0
    }

    fn bilinear(&self, pos: Vec2, outside: f32, at: impl Fn(usize) -> f32) -> f32 {
        let g = (pos + self.half_size) / (2.0 * self.half_size) * self.side as f32 - 0.5;
        let x0 = g.x.floor();
        let y0 = g.y.floor();
        let fx = g.x - x0;
        let fy = g.y - y0;
        let fetch = |x: f32, y: f32| {
            let limit = self.side as f32;
            if x < 0.0 || y < 0.0 || x >= limit || y >= limit {
                outside
            } else {
                at(y as usize * self.side + x as usize)
            }
        };
        let a = fetch(x0, y0);
        let b = fetch(x0 + 1.0, y0);
        let c = fetch(x0, y0 + 1.0);
        let d = fetch(x0 + 1.0, y0 + 1.0);
        let top = a + (b - a) * fx;
        let bottom = c + (d - c) * fx;
        top + (bottom - top) * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_water_is_deep_everywhere() {
        let env = EnvironmentDepthField::open_water(10.0).unwrap();
        for p in [Vec2::ZERO, Vec2::new(9.9, -9.9), Vec2::new(500.0, 0.0)] {
            assert_eq!(env.depth_at(p), OPEN_WATER_DEPTH);
            assert_eq!(env.gradient_at(p), Vec2::ZERO);
            assert!(env.in_domain(p));
        }
    }

    #[test]
    fn rejects_non_square_and_non_finite() {
        assert!(EnvironmentDepthField::from_depths(1.0, vec![1.0; 5]).is_err());
        assert!(EnvironmentDepthField::from_depths(1.0, vec![1.0]).is_err());
        assert!(EnvironmentDepthField::from_depths(1.0, vec![1.0, f32::NAN, 1.0, 1.0]).is_err());
        assert!(EnvironmentDepthField::from_depths(0.0, vec![1.0; 4]).is_err());
    }

    #[test]
    fn samples_hit_cell_centres() {
        // 2x2 map over [-1, 1]²: centres at ±0.5.
        let env = EnvironmentDepthField::from_depths(1.0, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(env.depth_at(Vec2::new(-0.5, -0.5)), 1.0);
        assert_eq!(env.depth_at(Vec2::new(0.5, -0.5)), 2.0);
        assert_eq!(env.depth_at(Vec2::new(-0.5, 0.5)), 3.0);
        assert_eq!(env.depth_at(Vec2::ZERO), 2.5);
    }

    #[test]
    fn terrain_above_water_is_dry() {
        let heights = [0.0, 0.0, 5.0, 5.0];
        let env = EnvironmentDepthField::from_terrain(1.0, &heights, 2.0).unwrap();
        assert!(env.in_domain(Vec2::new(0.0, -0.5)));
        assert!(!env.in_domain(Vec2::new(0.0, 0.5)));
    }

    #[test]
    fn gradient_points_to_deeper_water() {
        let side = 4;
        let depths: Vec<f32> = (0..side * side).map(|i| (i % side) as f32).collect();
        let env = EnvironmentDepthField::from_depths(2.0, depths).unwrap();
        let g = env.gradient_at(Vec2::new(-1.0, -1.0));
        assert!((g - Vec2::X).length() < 1e-5, "{g:?}");
    }
}
