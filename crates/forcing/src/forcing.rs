use serde::{Deserialize, Serialize};
use wavegrid_common::DIRECTIONS;

/// Ambient amplitude per direction bucket.
pub type DirectionalAmplitude = [f32; DIRECTIONS];

/// Wind inputs that drive the ambient field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSettings {
    /// Compass direction the wind comes from, in degrees.
    pub direction_deg: f32,
    /// Amplitude injected at the inflow boundary.
    pub amplitude: f32,
    /// Yaw of the simulation domain in the world, in degrees.
    pub domain_rotation_deg: f32,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            direction_deg: 0.0,
            amplitude: 1.0,
            domain_rotation_deg: 0.0,
        }
    }
}

/// Map wind direction into grid space and split `wave_amplitude` between the
/// two neighbouring buckets.
pub fn default_amplitude(
    wind_direction_deg: f32,
    domain_rotation_deg: f32,
    wave_amplitude: f32,
) -> DirectionalAmplitude {
    let mut result = [0.0; DIRECTIONS];

    let mut corrected = (360.0 - wind_direction_deg + domain_rotation_deg + 90.0) % 360.0;
    if corrected <= 0.0 {
        corrected += 360.0;
    }

    let i_theta = corrected / 360.0 * DIRECTIONS as f32 - 1.0;
    let t = (i_theta % 1.0).abs();

    let n = DIRECTIONS as i64;
    let low = (i_theta.floor() as i64).rem_euclid(n) as usize;
    let high = (i_theta.ceil() as i64).rem_euclid(n) as usize;

    if low == high {
        result[low] = wave_amplitude;
    } else {
        result[low] = lerp(0.0, wave_amplitude, 1.0 - t);
        result[high] = lerp(0.0, wave_amplitude, t);
    }
    result
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Recomputes the amplitude vector only when the wind inputs change.
#[derive(Debug, Clone)]
pub struct ForcingCache {
    wind: WindSettings,
    amplitude: DirectionalAmplitude,
}

impl ForcingCache {
    pub fn new(wind: WindSettings) -> Self {
        Self {
            wind,
            amplitude: default_amplitude(
                wind.direction_deg,
                wind.domain_rotation_deg,
                wind.amplitude,
            ),
        }
    }

    /// Refresh for the given wind. Returns true if the vector changed.
    pub fn refresh(&mut self, wind: WindSettings) -> bool {
        if wind == self.wind {
            return false;
        }
        self.wind = wind;
        self.amplitude = default_amplitude(wind.direction_deg, wind.domain_rotation_deg, wind.amplitude);
        tracing::debug!(
            direction = wind.direction_deg,
            rotation = wind.domain_rotation_deg,
            amplitude = wind.amplitude,
            "directional forcing recomputed"
        );
        true
    }

    pub fn wind(&self) -> WindSettings {
        self.wind
    }

    pub fn amplitude(&self) -> &DirectionalAmplitude {
        &self.amplitude
    }
}
