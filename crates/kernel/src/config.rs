//! Construction-time configuration, validated once and immutable afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use wavegrid_common::WaveError;
use wavegrid_forcing::WindSettings;
use wavegrid_spectrum::{DEFAULT_GROUP_SPEED_CORRECTION, ProfileSettings, SpectrumKind};

/// Smallest supported grid side.
pub const MIN_RESOLUTION: usize = 4;

/// Which compute backend drives the per-tick passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Sequential,
    #[default]
    Parallel,
}

impl BackendKind {
    /// Rows per work unit; the grid side must be a multiple of it.
    pub fn tile_size(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel => 8,
        }
    }
}

/// Smoothing applied to the ambient field after advection.
///
/// `out = c + spatial·(Σ4 neighbours − 4c) + angular·(c[d−1] + c[d+1] − 2c)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionKernel {
    pub spatial: f32,
    pub angular: f32,
}

impl DiffusionKernel {
    pub const NONE: Self = Self {
        spatial: 0.0,
        angular: 0.0,
    };

    pub fn validate(&self) -> Result<(), WaveError> {
        let ok = |v: f32| v.is_finite() && v >= 0.0;
        if !ok(self.spatial) || !ok(self.angular) {
            return Err(WaveError::config(format!(
                "diffusion weights must be finite and >= 0, got {self:?}"
            )));
        }
        if 4.0 * self.spatial + 2.0 * self.angular > 1.0 {
            return Err(WaveError::config(format!(
                "diffusion kernel is not positivity-preserving (4*spatial + 2*angular > 1): {self:?}"
            )));
        }
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        self.spatial == 0.0 && self.angular == 0.0
    }
}

impl Default for DiffusionKernel {
    fn default() -> Self {
        Self {
            spatial: 0.02,
            angular: 0.05,
        }
    }
}

/// Shallow-water slowing and bending of the group velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefractionParams {
    pub enabled: bool,
    /// Depth at which waves reach ~76% (tanh 1) of their deep-water speed.
    pub reference_depth: f32,
    /// Floor on the speed factor so energy never stalls completely.
    pub min_speed_factor: f32,
    /// How strongly slowed waves turn down the depth gradient.
    pub bend_strength: f32,
}

impl Default for RefractionParams {
    fn default() -> Self {
        Self {
            enabled: true,
            reference_depth: 4.0,
            min_speed_factor: 0.2,
            bend_strength: 0.5,
        }
    }
}

impl RefractionParams {
    pub fn validate(&self) -> Result<(), WaveError> {
        if !(self.reference_depth.is_finite() && self.reference_depth > 0.0) {
            return Err(WaveError::config("refraction reference_depth must be > 0"));
        }
        if !(self.min_speed_factor > 0.0 && self.min_speed_factor <= 1.0) {
            return Err(WaveError::config(
                "refraction min_speed_factor must be in (0, 1]",
            ));
        }
        if !(self.bend_strength.is_finite() && self.bend_strength >= 0.0) {
            return Err(WaveError::config("refraction bend_strength must be >= 0"));
        }
        Ok(())
    }

    /// Fraction of the deep-water speed at `depth`.
    pub fn speed_factor(&self, depth: f32) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        (depth.max(0.0) / self.reference_depth)
            .tanh()
            .clamp(self.min_speed_factor, 1.0)
    }

    /// Travel direction after bending toward shallower water.
    pub fn bend(&self, dir: Vec2, depth_gradient: Vec2, speed_factor: f32) -> Vec2 {
        if !self.enabled || speed_factor >= 1.0 || self.bend_strength == 0.0 {
            return dir;
        }
        let bent = dir - self.bend_strength * (1.0 - speed_factor) * depth_gradient;
        bent.try_normalize().unwrap_or(dir)
    }
}

/// Everything needed to build a [`crate::WaveGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Half the side length of the square domain, in metres.
    pub domain_half_size: f32,
    /// `log2` of the shortest simulated wavelength.
    pub z_min: f64,
    /// `log2` of the longest simulated wavelength.
    pub z_max: f64,
    /// Interior grid side `N`.
    pub resolution: usize,
    pub zeta_bands: usize,
    /// Simulation time at construction, in seconds.
    pub initial_time: f64,
    pub spectrum: SpectrumKind,
    pub profile: ProfileSettings,
    pub group_speed_correction: f64,
    /// Per-tick decay of the disturbance field.
    pub dissipation: f32,
    pub diffusion: DiffusionKernel,
    pub refraction: RefractionParams,
    /// Wind at construction; ticks may override it.
    pub wind: WindSettings,
    pub backend: BackendKind,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            domain_half_size: 64.0,
            z_min: 0.03f64.log2(),
            z_max: 10f64.log2(),
            resolution: 128,
            zeta_bands: 1,
            initial_time: 100.0,
            spectrum: SpectrumKind::default(),
            profile: ProfileSettings::default(),
            group_speed_correction: DEFAULT_GROUP_SPEED_CORRECTION,
            dissipation: 0.99,
            diffusion: DiffusionKernel::default(),
            refraction: RefractionParams::default(),
            wind: WindSettings::default(),
            backend: BackendKind::default(),
        }
    }
}

impl GridConfig {
    /// Validate against the configured backend's tiling.
    pub fn validate(&self) -> Result<(), WaveError> {
        self.validate_for_tile(self.backend.tile_size())
    }

    pub fn validate_for_tile(&self, tile: usize) -> Result<(), WaveError> {
        if !(self.domain_half_size.is_finite() && self.domain_half_size > 0.0) {
            return Err(WaveError::config(format!(
                "domain_half_size must be > 0, got {}",
                self.domain_half_size
            )));
        }
        if !(self.z_min.is_finite() && self.z_max.is_finite()) || self.z_min >= self.z_max {
            return Err(WaveError::config(format!(
                "z_min must be < z_max, got [{}, {}]",
                self.z_min, self.z_max
            )));
        }
        if self.resolution < MIN_RESOLUTION || !self.resolution.is_power_of_two() {
            return Err(WaveError::config(format!(
                "resolution must be a power of two >= {MIN_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if tile == 0 || self.resolution % tile != 0 {
            return Err(WaveError::config(format!(
                "resolution {} does not tile into blocks of {tile}",
                self.resolution
            )));
        }
        if self.zeta_bands == 0 {
            return Err(WaveError::config("zeta_bands must be >= 1"));
        }
        if !self.initial_time.is_finite() {
            return Err(WaveError::config("initial_time must be finite"));
        }
        if let SpectrumKind::PiersonMoskowitz { wind_speed } = self.spectrum {
            if !(wind_speed.is_finite() && wind_speed > 0.0) {
                return Err(WaveError::config(format!(
                    "wind_speed must be > 0, got {wind_speed}"
                )));
            }
        }
        self.profile.validate()?;
        if !(self.group_speed_correction.is_finite() && self.group_speed_correction > 0.0) {
            return Err(WaveError::config("group_speed_correction must be > 0"));
        }
        if !(self.dissipation > 0.0 && self.dissipation <= 1.0) {
            return Err(WaveError::config(format!(
                "dissipation must be in (0, 1], got {}",
                self.dissipation
            )));
        }
        self.diffusion.validate()?;
        self.refraction.validate()?;
        let w = self.wind;
        if !(w.direction_deg.is_finite()
            && w.amplitude.is_finite()
            && w.domain_rotation_deg.is_finite())
        {
            return Err(WaveError::config("wind settings must be finite"));
        }
        Ok(())
    }

    /// Side length of one grid cell.
    pub fn cell_size(&self) -> f32 {
        self.domain_half_size * 2.0 / self.resolution as f32
    }

    /// Zeta sub-range covered by band `band`.
    pub fn band_range(&self, band: usize) -> (f64, f64) {
        let dz = (self.z_max - self.z_min) / self.zeta_bands as f64;
        let lo = self.z_min + band as f64 * dz;
        (lo, lo + dz)
    }
}
