use serde::{Deserialize, Serialize};
use wavegrid_common::WaveError;

/// Energy density as a function of zeta (`log2` of wavelength).
pub trait Spectrum: Send + Sync {
    fn density(&self, zeta: f64) -> f64;
}

/// Wind-driven spectrum, fully developed sea.
///
/// `density(ζ) = 0.139098 · sqrt(1.1^(1.5ζ) · exp(-1.8038897788 · 4^ζ / U⁴))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiersonMoskowitz {
    wind_speed: f64,
}

impl PiersonMoskowitz {
    const SCALE: f64 = 0.139098;
    const GROWTH_BASE: f64 = 1.1;
    const CUTOFF: f64 = 1.8038897788076411;

    pub fn new(wind_speed: f64) -> Result<Self, WaveError> {
        if !(wind_speed.is_finite() && wind_speed > 0.0) {
            return Err(WaveError::parameter(
                "wind_speed",
                format!("must be finite and > 0, got {wind_speed}"),
            ));
        }
        Ok(Self { wind_speed })
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }
}

impl Spectrum for PiersonMoskowitz {
    fn density(&self, zeta: f64) -> f64 {
        let a = Self::GROWTH_BASE.powf(1.5 * zeta);
        let b = (-Self::CUTOFF * 4f64.powf(zeta) / self.wind_speed.powi(4)).exp();
        Self::SCALE * (a * b).sqrt()
    }
}

/// Constant density, used to calibrate the dispersion integrals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformSpectrum;

impl Spectrum for UniformSpectrum {
    fn density(&self, _zeta: f64) -> f64 {
        1.0
    }
}

/// Serializable spectrum selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpectrumKind {
    PiersonMoskowitz { wind_speed: f64 },
    Uniform,
}

impl Default for SpectrumKind {
    fn default() -> Self {
        Self::PiersonMoskowitz { wind_speed: 10.0 }
    }
}

impl SpectrumKind {
    /// Instantiate the selected spectrum, validating its parameters.
    pub fn build(&self) -> Result<Box<dyn Spectrum>, WaveError> {
        match *self {
            Self::PiersonMoskowitz { wind_speed } => Ok(Box::new(PiersonMoskowitz::new(wind_speed)?)),
            Self::Uniform => Ok(Box::new(UniformSpectrum)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_wind() {
        assert!(matches!(
            PiersonMoskowitz::new(0.0),
            Err(WaveError::InvalidParameter { name: "wind_speed", .. })
        ));
        assert!(PiersonMoskowitz::new(-4.0).is_err());
        assert!(PiersonMoskowitz::new(f64::NAN).is_err());
    }

    #[test]
    fn density_finite_and_non_negative() {
        for &wind in &[0.5, 1.0, 5.0, 10.0, 30.0] {
            let s = PiersonMoskowitz::new(wind).unwrap();
            let mut zeta = -10.0;
            while zeta <= 10.0 {
                let d = s.density(zeta);
                assert!(d.is_finite(), "wind={wind} zeta={zeta} d={d}");
                assert!(d >= 0.0, "wind={wind} zeta={zeta} d={d}");
                zeta += 0.25;
            }
        }
    }

    #[test]
    fn density_matches_closed_form() {
        let s = PiersonMoskowitz::new(10.0).unwrap();
        // zeta = 0: A = 1, B = exp(-1.8038897788 / 10^4)
        let expected = 0.139098 * (-1.8038897788076411f64 / 1.0e4).exp().sqrt();
        assert!((s.density(0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn long_waves_are_cut_off_by_wind() {
        let s = PiersonMoskowitz::new(2.0).unwrap();
        assert!(s.density(8.0) < 1e-6);
        assert!(s.density(0.0) > 0.1);
    }

    #[test]
    fn selector_builds_spectra() {
        let pm = SpectrumKind::default().build().unwrap();
        assert!(pm.density(1.0) > 0.0);
        let uniform = SpectrumKind::Uniform.build().unwrap();
        assert_eq!(uniform.density(-3.0), 1.0);
        assert!(
            SpectrumKind::PiersonMoskowitz { wind_speed: 0.0 }
                .build()
                .is_err()
        );
    }
}
