//! Periodic, time-phased displacement lookup ("profile buffer").
//!
//! The buffer stores a superposition of Gerstner waves at the quadrature
//! wavelengths, weighted by spectral density. Two copies shifted by one period
//! are blended with cubic bumps so the result is exactly periodic over
//! `periodicity * 2^z_max`.

use std::f64::consts::TAU;

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wavegrid_common::WaveError;

use crate::dispersion::{Quadrature, angular_frequency, group_speed, wavelength};
use crate::spectrum::Spectrum;

/// Sampling parameters of a profile buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Number of samples across one period.
    pub resolution: usize,
    /// Quadrature nodes over the zeta band.
    pub integration_nodes: usize,
    /// Period in units of the longest wavelength.
    pub periodicity: u32,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            resolution: 4096,
            integration_nodes: 96,
            periodicity: 2,
        }
    }
}

impl ProfileSettings {
    pub fn validate(&self) -> Result<(), WaveError> {
        if self.resolution == 0 {
            return Err(WaveError::config("profile resolution must be > 0"));
        }
        if self.integration_nodes == 0 {
            return Err(WaveError::config("profile integration_nodes must be > 0"));
        }
        if self.periodicity == 0 {
            return Err(WaveError::config("profile periodicity must be >= 1"));
        }
        Ok(())
    }
}

/// One profile sample: displacement along and across the travel axis, and
/// their derivatives with respect to position along the axis.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ProfileSample {
    pub horizontal: f32,
    pub vertical: f32,
    pub horizontal_slope: f32,
    pub vertical_slope: f32,
}

impl ProfileSample {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            horizontal: self.horizontal + (other.horizontal - self.horizontal) * t,
            vertical: self.vertical + (other.vertical - self.vertical) * t,
            horizontal_slope: self.horizontal_slope
                + (other.horizontal_slope - self.horizontal_slope) * t,
            vertical_slope: self.vertical_slope + (other.vertical_slope - self.vertical_slope) * t,
        }
    }
}

/// Per-node constants, fixed for the buffer's lifetime.
#[derive(Debug, Clone, Copy)]
struct Component {
    wavenumber: f64,
    omega: f64,
    /// `λ · ρ(ζ) · dζ`
    weight: f64,
}

#[derive(Debug, Clone)]
pub struct ProfileBuffer {
    quadrature: Quadrature,
    settings: ProfileSettings,
    period: f64,
    group_speed: f64,
    components: Vec<Component>,
    samples: Vec<ProfileSample>,
    time: f64,
}

impl ProfileBuffer {
    /// Integrate the spectrum over `[z_min, z_max]` and synthesize the buffer at time 0.
    pub fn new(
        z_min: f64,
        z_max: f64,
        settings: ProfileSettings,
        spectrum: &dyn Spectrum,
        correction: f64,
    ) -> Result<Self, WaveError> {
        settings.validate()?;
        let quadrature = Quadrature::new(z_min, z_max, settings.integration_nodes)?;
        let group_speed = group_speed(spectrum, &quadrature, correction)?;

        let period = f64::from(settings.periodicity) * wavelength(z_max);
        if !period.is_finite() || period <= 0.0 {
            return Err(WaveError::NumericDegenerate(format!(
                "profile period is {period} for z_max {z_max}"
            )));
        }

        let dz = quadrature.step();
        let components = quadrature
            .points()
            .map(|z| {
                let lambda = wavelength(z);
                let k = TAU / lambda;
                Component {
                    wavenumber: k,
                    omega: angular_frequency(k),
                    weight: lambda * spectrum.density(z) * dz,
                }
            })
            .collect();

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(settings.resolution)
            .map_err(|_| WaveError::ResourceAllocationFailure {
                what: "profile buffer",
                bytes: settings.resolution * std::mem::size_of::<ProfileSample>(),
            })?;
        samples.resize(settings.resolution, ProfileSample::default());

        let mut buffer = Self {
            quadrature,
            settings,
            period,
            group_speed,
            components,
            samples,
            time: 0.0,
        };
        buffer.precompute_sequential(0.0);

        tracing::debug!(
            z_min,
            z_max,
            period,
            group_speed,
            resolution = settings.resolution,
            "profile buffer created"
        );
        Ok(buffer)
    }

    /// Re-phase every sample to simulation time `time`, in parallel.
    pub fn precompute(&mut self, time: f64) {
        let period = self.period;
        let resolution = self.samples.len();
        let components = &self.components;
        self.samples
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, sample)| {
                *sample = synthesize(components, period, resolution, i, time);
            });
        self.time = time;
    }

    /// Same result as [`Self::precompute`], on the calling thread only.
    pub fn precompute_sequential(&mut self, time: f64) {
        let period = self.period;
        let resolution = self.samples.len();
        for (i, sample) in self.samples.iter_mut().enumerate() {
            *sample = synthesize(&self.components, period, resolution, i, time);
        }
        self.time = time;
    }

    /// Evaluate the buffer at position `p` along the travel axis (periodic).
    pub fn sample(&self, p: f64) -> ProfileSample {
        let n = self.samples.len();
        let x = (p / self.period).rem_euclid(1.0) * n as f64;
        let i0 = (x.floor() as usize) % n;
        let i1 = (i0 + 1) % n;
        let t = (x - x.floor()) as f32;
        self.samples[i0].lerp(self.samples[i1], t)
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn group_speed(&self) -> f64 {
        self.group_speed
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    /// Raw sample bytes, four `f32` per sample, ready for a texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.samples)
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn zeta_range(&self) -> (f64, f64) {
        (self.quadrature.z_min, self.quadrature.z_max)
    }

    /// Upper bound on `|vertical|`: the total component weight.
    pub fn amplitude_bound(&self) -> f64 {
        self.components.iter().map(|c| c.weight.abs()).sum()
    }
}

/// Sample `i` of `resolution` at time `time`.
fn synthesize(
    components: &[Component],
    period: f64,
    resolution: usize,
    i: usize,
    time: f64,
) -> ProfileSample {
    let p = i as f64 * period / resolution as f64;
    let w1 = cubic_bump(p / period);
    let w2 = cubic_bump(1.0 - p / period);
    let mut acc = [0.0f64; 4];
    for c in components {
        let phase1 = c.wavenumber * p - c.omega * time;
        let phase2 = c.wavenumber * (p - period) - c.omega * time;
        let g1 = gerstner(phase1, c.wavenumber);
        let g2 = gerstner(phase2, c.wavenumber);
        for (a, (x1, x2)) in acc.iter_mut().zip(g1.into_iter().zip(g2)) {
            *a += c.weight * (w1 * x1 + w2 * x2);
        }
    }
    ProfileSample {
        horizontal: acc[0] as f32,
        vertical: acc[1] as f32,
        horizontal_slope: acc[2] as f32,
        vertical_slope: acc[3] as f32,
    }
}

/// Trochoidal wave at `phase = k·x - ω·t`.
fn gerstner(phase: f64, k: f64) -> [f64; 4] {
    let (s, c) = phase.sin_cos();
    [-s, c, -k * c, -k * s]
}

/// Hermite basis `p0`, supported on `(-1, 1)`.
fn cubic_bump(x: f64) -> f64 {
    if x.abs() >= 1.0 {
        0.0
    } else {
        x * x * (2.0 * x.abs() - 3.0) + 1.0
    }
}
