//! Deep-water dispersion and the spectrum-weighted group-speed integral.

use std::f64::consts::TAU;

use wavegrid_common::{GRAVITY, WaveError};

use crate::spectrum::Spectrum;

/// Empirical factor applied to the spectrum-weighted mean group velocity.
///
/// Carried over from the reference engine without a derivation; overridable
/// through the grid configuration.
pub const DEFAULT_GROUP_SPEED_CORRECTION: f64 = 3.0;

pub fn wavelength(zeta: f64) -> f64 {
    zeta.exp2()
}

pub fn wavenumber(zeta: f64) -> f64 {
    TAU / wavelength(zeta)
}

/// Angular frequency `ω = sqrt(g·k)`.
pub fn angular_frequency(k: f64) -> f64 {
    (GRAVITY * k).sqrt()
}

/// `c_g = 0.5 · sqrt(g / k)`.
pub fn group_velocity(zeta: f64) -> f64 {
    0.5 * (GRAVITY / wavenumber(zeta)).sqrt()
}

/// Midpoint quadrature over `[z_min, z_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub z_min: f64,
    pub z_max: f64,
    pub nodes: usize,
}

impl Quadrature {
    pub fn new(z_min: f64, z_max: f64, nodes: usize) -> Result<Self, WaveError> {
        if !(z_min.is_finite() && z_max.is_finite()) || z_min >= z_max {
            return Err(WaveError::config(format!(
                "zeta range must satisfy z_min < z_max, got [{z_min}, {z_max}]"
            )));
        }
        if nodes == 0 {
            return Err(WaveError::config("integration_nodes must be > 0"));
        }
        Ok(Self {
            z_min,
            z_max,
            nodes,
        })
    }

    pub fn step(&self) -> f64 {
        (self.z_max - self.z_min) / self.nodes as f64
    }

    /// Sample points `z_i = z_min + (i + 0.5)·dz`.
    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        let dz = self.step();
        (0..self.nodes).map(move |i| self.z_min + (i as f64 + 0.5) * dz)
    }

    pub fn integrate(&self, f: impl Fn(f64) -> f64) -> f64 {
        let dz = self.step();
        self.points().map(|z| f(z) * dz).sum()
    }
}

/// Representative propagation speed of wave energy over the band.
///
/// `correction · ∫ c_g(ζ)·ρ(ζ) dζ / ∫ ρ(ζ) dζ`
pub fn group_speed(
    spectrum: &dyn Spectrum,
    quadrature: &Quadrature,
    correction: f64,
) -> Result<f64, WaveError> {
    let weighted = quadrature.integrate(|z| group_velocity(z) * spectrum.density(z));
    let total = quadrature.integrate(|z| spectrum.density(z));
    let speed = correction * weighted / total;

    if !speed.is_finite() || speed <= 0.0 {
        return Err(WaveError::NumericDegenerate(format!(
            "group speed is {speed} over zeta [{}, {}] (density integral {total})",
            quadrature.z_min, quadrature.z_max
        )));
    }
    tracing::debug!(speed, correction, nodes = quadrature.nodes, "group speed integrated");
    Ok(speed)
}
