use std::time::{Duration, Instant};

use glam::Vec2;
use serde::Serialize;
use wavegrid_common::{
    DIRECTIONS, DisturbanceEvent, WaveError, fraction_from_angle, fraction_from_vector,
};
use wavegrid_forcing::{DirectionalAmplitude, ForcingCache, WindSettings};
use wavegrid_spectrum::ProfileBuffer;

use crate::backend::{self, GridBackend};
use crate::config::GridConfig;
use crate::disturbance::{self, DisturbanceQueue, DisturbanceSender};
use crate::environment::EnvironmentDepthField;
use crate::field::{AmplitudeField, PingPong};
use crate::velocity::VelocityField;

/// Lifecycle of a [`WaveGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridState {
    Ready,
    Stepping,
    Disposed,
}

impl GridState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Stepping => "stepping",
            Self::Disposed => "disposed",
        }
    }
}

/// Per-frame input to [`WaveGrid::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Wall-clock seconds since the previous tick.
    pub frame_delta: f32,
    /// When false only the profile buffers and the merged output are refreshed.
    pub update_simulation: bool,
    /// Replaces the current wind before forcing is recomputed.
    pub wind: Option<WindSettings>,
}

impl TickInput {
    pub fn new(frame_delta: f32) -> Self {
        Self {
            frame_delta,
            update_simulation: true,
            wind: None,
        }
    }

    /// Advance time and profiles without transporting energy.
    pub fn paused(frame_delta: f32) -> Self {
        Self {
            update_simulation: false,
            ..Self::new(frame_delta)
        }
    }

    pub fn with_wind(mut self, wind: WindSettings) -> Self {
        self.wind = Some(wind);
        self
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickStats {
    pub tick: u64,
    /// Simulation time after the tick, in seconds.
    pub time: f64,
    /// Grid-time advanced by transport, in seconds.
    pub dt_sim: f32,
    pub events_applied: usize,
    pub events_rejected: usize,
    pub ambient_energy: f64,
    pub disturbance_energy: f64,
    pub elapsed: Duration,
}

/// A square wave-energy grid over `[-H, H]²`.
///
/// Two fields are transported every tick: an ambient field fed from the
/// domain edges by wind forcing, and a disturbance field that receives
/// point events and decays. Their clamped sum is exposed as the output
/// field, together with one Gerstner profile buffer per zeta band.
///
/// Ticks are serialized by `&mut self`; other threads queue events through
/// a [`DisturbanceSender`].
#[derive(Debug)]
pub struct WaveGrid {
    config: GridConfig,
    state: GridState,
    backend: Box<dyn GridBackend>,
    environment: EnvironmentDepthField,
    flow: VelocityField,
    profiles: Vec<ProfileBuffer>,
    group_speed: f32,
    cell_size: f32,
    cfl_timestep: f32,
    forcing: ForcingCache,
    ambient: PingPong,
    disturbance: PingPong,
    output: AmplitudeField,
    queue: DisturbanceQueue,
    time: f64,
    tick: u64,
}

impl WaveGrid {
    /// Build a grid over open water using the configured backend.
    pub fn new(config: GridConfig) -> Result<Self, WaveError> {
        let environment = EnvironmentDepthField::open_water(config.domain_half_size)?;
        Self::with_environment(config, environment)
    }

    /// Build a grid over the given depth map using the configured backend.
    pub fn with_environment(
        config: GridConfig,
        environment: EnvironmentDepthField,
    ) -> Result<Self, WaveError> {
        let backend = backend::create(config.backend);
        Self::with_backend(config, environment, backend)
    }

    /// Build a grid driven by an explicit backend.
    ///
    /// Fails with no partially built grid on invalid configuration,
    /// allocation failure, or a degenerate group speed.
    pub fn with_backend(
        config: GridConfig,
        environment: EnvironmentDepthField,
        backend: Box<dyn GridBackend>,
    ) -> Result<Self, WaveError> {
        let _span = tracing::info_span!("wave_grid_init", resolution = config.resolution).entered();
        config.validate_for_tile(backend.tile_size())?;
        if (environment.half_size() - config.domain_half_size).abs()
            > f32::EPSILON * config.domain_half_size
        {
            return Err(WaveError::config(format!(
                "environment covers half-size {}, grid covers {}",
                environment.half_size(),
                config.domain_half_size
            )));
        }

        let spectrum = config.spectrum.build()?;
        let mut profiles = Vec::with_capacity(config.zeta_bands);
        for band in 0..config.zeta_bands {
            let (z_min, z_max) = config.band_range(band);
            let mut profile = ProfileBuffer::new(
                z_min,
                z_max,
                config.profile,
                spectrum.as_ref(),
                config.group_speed_correction,
            )?;
            backend.precompute_profile(&mut profile, config.initial_time);
            profiles.push(profile);
        }

        let group_speed = profiles
            .first()
            .map(|p| p.group_speed() as f32)
            .unwrap_or_default();
        let cell_size = config.cell_size();
        let cfl_timestep = cell_size / group_speed;
        if !(group_speed.is_finite() && group_speed > 0.0 && cfl_timestep.is_finite()) {
            return Err(WaveError::NumericDegenerate(format!(
                "group speed {group_speed} gives CFL timestep {cfl_timestep}"
            )));
        }

        let flow = VelocityField::build(
            config.resolution,
            config.domain_half_size,
            group_speed,
            &environment,
            &config.refraction,
        )?;
        let ambient = PingPong::new(config.resolution)?;
        let disturbance = PingPong::new(config.resolution)?;
        let output = AmplitudeField::new(config.resolution)?;
        let forcing = ForcingCache::new(config.wind);

        tracing::info!(
            backend = backend.name(),
            group_speed,
            cell_size,
            cfl_timestep,
            bands = config.zeta_bands,
            "wave grid ready"
        );

        Ok(Self {
            time: config.initial_time,
            config,
            state: GridState::Ready,
            backend,
            environment,
            flow,
            profiles,
            group_speed,
            cell_size,
            cfl_timestep,
            forcing,
            ambient,
            disturbance,
            output,
            queue: DisturbanceQueue::new(),
            tick: 0,
        })
    }

    /// Advance the simulation by one frame.
    ///
    /// Order: queued events, profile buffers, forcing, then (unless paused)
    /// inflow, advection, diffusion and dissipation, then merge and edge
    /// update. Invalid input is rejected before anything is mutated.
    pub fn tick(&mut self, input: &TickInput) -> Result<TickStats, WaveError> {
        self.ensure_ready("tick")?;
        if !(input.frame_delta.is_finite() && input.frame_delta >= 0.0) {
            return Err(WaveError::parameter(
                "frame_delta",
                format!("must be finite and >= 0, got {}", input.frame_delta),
            ));
        }
        if let Some(wind) = input.wind {
            if !(wind.direction_deg.is_finite()
                && wind.amplitude.is_finite()
                && wind.domain_rotation_deg.is_finite())
            {
                return Err(WaveError::parameter("wind", format!("must be finite, got {wind:?}")));
            }
        }

        let _span = tracing::info_span!("wave_tick", tick = self.tick + 1).entered();
        let started = Instant::now();
        self.state = GridState::Stepping;

        let (events_applied, events_rejected) = self.apply_queued();

        self.time += f64::from(input.frame_delta);
        for profile in &mut self.profiles {
            self.backend.precompute_profile(profile, self.time);
        }

        // Wind applies even when transport is paused.
        if let Some(wind) = input.wind {
            if self.forcing.refresh(wind) {
                tracing::debug!(?wind, "forcing refreshed");
            }
        }

        let dt_sim = self.cfl_timestep * input.frame_delta;
        if input.update_simulation {
            self.transport(dt_sim);
        }

        self.backend
            .merge(&self.ambient.front, &self.disturbance.front, &mut self.output);
        self.backend.update_edges(&mut self.output);

        self.tick += 1;
        self.state = GridState::Ready;

        let stats = TickStats {
            tick: self.tick,
            time: self.time,
            dt_sim: if input.update_simulation { dt_sim } else { 0.0 },
            events_applied,
            events_rejected,
            ambient_energy: self.ambient.front.total(),
            disturbance_energy: self.disturbance.front.total(),
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            dt_sim = stats.dt_sim,
            events_applied,
            ambient = stats.ambient_energy,
            disturbance = stats.disturbance_energy,
            "tick complete"
        );
        Ok(stats)
    }

    fn transport(&mut self, dt_sim: f32) {
        let scale = dt_sim / self.cell_size;

        self.ambient.front.fill_border(self.forcing.amplitude());
        self.disturbance.front.fill_border(&[0.0; DIRECTIONS]);

        tracing::trace!(scale, "advection");
        self.backend
            .advect(&self.ambient.front, &self.flow, scale, &mut self.ambient.back);
        self.backend.advect(
            &self.disturbance.front,
            &self.flow,
            scale,
            &mut self.disturbance.back,
        );
        tracing::trace!("diffusion");
        self.backend.diffuse(
            &self.ambient.back,
            &self.flow,
            &self.config.diffusion,
            &mut self.ambient.front,
        );
        tracing::trace!(factor = self.config.dissipation, "dissipation");
        self.backend.dissipate(
            &self.disturbance.back,
            self.config.dissipation,
            &mut self.disturbance.front,
        );
    }

    fn apply_queued(&mut self) -> (usize, usize) {
        let mut applied = 0;
        let mut rejected = 0;
        for event in self.queue.drain() {
            if disturbance::scatter(&mut self.disturbance.front, &event) {
                applied += 1;
            } else {
                rejected += 1;
                tracing::warn!(?event, "queued disturbance rejected");
            }
        }
        (applied, rejected)
    }

    /// Apply one normalized event immediately. Returns `false` if it was rejected.
    pub fn inject(&mut self, event: DisturbanceEvent) -> Result<bool, WaveError> {
        self.ensure_ready("inject")?;
        let accepted = disturbance::scatter(&mut self.disturbance.front, &event);
        if !accepted {
            tracing::warn!(?event, "disturbance rejected");
        }
        Ok(accepted)
    }

    /// Add `magnitude` to every direction bucket of the cell under `position`.
    ///
    /// `position` is in domain coordinates, `[-H, H]²`.
    pub fn add_point_disturbance(
        &mut self,
        position: Vec2,
        magnitude: f32,
    ) -> Result<bool, WaveError> {
        self.ensure_ready("add_point_disturbance")?;
        let events = disturbance::omnidirectional(self.normalize(position), magnitude);
        if !events[0].is_valid() {
            tracing::warn!(?position, magnitude, "point disturbance rejected");
            return Ok(false);
        }
        for event in &events {
            disturbance::scatter(&mut self.disturbance.front, event);
        }
        Ok(true)
    }

    /// Add `magnitude` travelling along `direction` at `position`.
    ///
    /// With `spread_sides` the magnitude is split over a fan of directions
    /// covering the forward half-plane; the fan's total equals `magnitude`.
    pub fn add_point_direction_disturbance(
        &mut self,
        position: Vec2,
        direction: Vec2,
        magnitude: f32,
        spread_sides: bool,
    ) -> Result<bool, WaveError> {
        self.ensure_ready("add_point_direction_disturbance")?;
        let Some(dir) = direction.try_normalize() else {
            tracing::warn!(?direction, "disturbance direction is zero or non-finite");
            return Ok(false);
        };
        let normalized = self.normalize(position);

        let fan = if spread_sides {
            disturbance::spread_fan(dir)
        } else {
            vec![(dir, 1.0)]
        };
        let mut events = Vec::with_capacity(fan.len());
        for (d, weight) in fan {
            let Some(fraction) = fraction_from_vector(d) else {
                continue;
            };
            let event = DisturbanceEvent::new(normalized, fraction, magnitude * weight);
            if !event.is_valid() {
                tracing::warn!(?position, magnitude, "directional disturbance rejected");
                return Ok(false);
            }
            events.push(event);
        }
        for event in &events {
            disturbance::scatter(&mut self.disturbance.front, event);
        }
        Ok(true)
    }

    /// Handle for queueing events from other threads.
    pub fn disturbance_sender(&self) -> DisturbanceSender {
        self.queue.sender()
    }

    /// Release all field and profile storage. Further ticks and injections fail.
    pub fn dispose(&mut self) {
        if self.state == GridState::Disposed {
            return;
        }
        let dropped = self.queue.drain().count();
        self.ambient.release();
        self.disturbance.release();
        self.output.release();
        self.profiles.clear();
        self.state = GridState::Disposed;
        tracing::info!(tick = self.tick, dropped_events = dropped, "wave grid disposed");
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), WaveError> {
        match self.state {
            GridState::Ready => Ok(()),
            state => Err(WaveError::InvalidState {
                operation,
                state: state.as_str(),
            }),
        }
    }

    fn normalize(&self, position: Vec2) -> Vec2 {
        let h = self.config.domain_half_size;
        (position + h) / (2.0 * h)
    }

    /// Merged amplitude at domain position `position` travelling at `angle` radians.
    ///
    /// Bilinear in space, linear between the two nearest direction buckets.
    pub fn amplitude_at(&self, position: Vec2, angle: f32) -> f32 {
        if self.output.is_released() {
            return 0.0;
        }
        let h = self.config.domain_half_size;
        let u = (position.x + h) / self.cell_size + 0.5;
        let v = (position.y + h) / self.cell_size + 0.5;
        let a = fraction_from_angle(angle) * DIRECTIONS as f32 - 0.5;
        let lower = a.floor();
        let t = a - lower;
        let d0 = (lower as i32).rem_euclid(DIRECTIONS as i32) as usize;
        let d1 = (d0 + 1) % DIRECTIONS;
        self.output.sample(u, v, d0) * (1.0 - t) + self.output.sample(u, v, d1) * t
    }

    /// Domain coordinate of the centre of interior cell `index` (along either axis).
    pub fn cell_center(&self, index: usize) -> f32 {
        -self.config.domain_half_size + (index as f32 + 0.5) * self.cell_size
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Simulated seconds that move deep-water energy one cell.
    pub fn cfl_timestep(&self) -> f32 {
        self.cfl_timestep
    }

    pub fn group_speed(&self) -> f32 {
        self.group_speed
    }

    /// Spatial period of the first profile band.
    pub fn period(&self) -> f64 {
        self.profiles.first().map(|p| p.period()).unwrap_or_default()
    }

    pub fn profile(&self, band: usize) -> Option<&ProfileBuffer> {
        self.profiles.get(band)
    }

    pub fn profiles(&self) -> &[ProfileBuffer] {
        &self.profiles
    }

    /// Current forcing injected at the domain edges.
    pub fn default_amplitude(&self) -> &DirectionalAmplitude {
        self.forcing.amplitude()
    }

    pub fn wind(&self) -> WindSettings {
        self.forcing.wind()
    }

    pub fn depth_at(&self, position: Vec2) -> f32 {
        self.environment.depth_at(position)
    }

    /// Merged field, including its refreshed padding ring.
    pub fn output(&self) -> &AmplitudeField {
        &self.output
    }

    pub fn ambient(&self) -> &AmplitudeField {
        &self.ambient.front
    }

    pub fn disturbance(&self) -> &AmplitudeField {
        &self.disturbance.front
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Completed ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Deterministic FNV-1a hash of tick, time and every field's bits.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.time.to_bits().to_le_bytes());
        for field in [&self.ambient.front, &self.disturbance.front, &self.output] {
            for a in field.as_slice() {
                mix(&mut h, &a.to_bits().to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, DiffusionKernel};
    use wavegrid_common::bucket_direction;
    use wavegrid_spectrum::ProfileSettings;

    /// Cell size 1 and a tiny profile so tests stay fast.
    fn small_config() -> GridConfig {
        GridConfig {
            domain_half_size: 16.0,
            resolution: 32,
            profile: ProfileSettings {
                resolution: 64,
                integration_nodes: 8,
                periodicity: 2,
            },
            backend: BackendKind::Sequential,
            ..GridConfig::default()
        }
    }

    fn still_config() -> GridConfig {
        GridConfig {
            dissipation: 1.0,
            diffusion: DiffusionKernel::NONE,
            wind: WindSettings {
                amplitude: 0.0,
                ..WindSettings::default()
            },
            ..small_config()
        }
    }

    fn centre_of_mass(field: &AmplitudeField, d: usize) -> (Vec2, f32) {
        let mut sum = Vec2::ZERO;
        let mut mass = 0.0;
        for y in 1..=field.resolution() {
            for x in 1..=field.resolution() {
                let a = field.get(x, y, d);
                sum += Vec2::new(x as f32, y as f32) * a;
                mass += a;
            }
        }
        (sum / mass, mass)
    }

    #[test]
    fn construction_reports_derived_quantities() {
        let grid = WaveGrid::new(small_config()).unwrap();
        assert_eq!(grid.state(), GridState::Ready);
        assert_eq!(grid.cell_size(), 1.0);
        assert!(grid.group_speed() > 0.0);
        assert!((grid.cfl_timestep() * grid.group_speed() - 1.0).abs() < 1e-5);
        assert_eq!(grid.time(), 100.0);
        assert_eq!(grid.profiles().len(), 1);
        assert_eq!(grid.profile(0).unwrap().time(), 100.0);
        assert!(grid.profile(1).is_none());
        assert_eq!(grid.cell_center(0), -15.5);
        assert_eq!(grid.cell_center(31), 15.5);
        assert!(grid.output().as_slice().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn invalid_configuration_is_fatal() {
        let config = GridConfig {
            resolution: 48,
            ..small_config()
        };
        let err = WaveGrid::new(config).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn huge_resolution_fails_without_panicking() {
        let config = GridConfig {
            resolution: 1 << (usize::BITS / 2),
            ..small_config()
        };
        assert!(config.validate().is_ok());
        let err = WaveGrid::new(config).unwrap_err();
        assert!(matches!(err, WaveError::ResourceAllocationFailure { .. }), "{err:?}");
    }

    #[test]
    fn bands_split_the_zeta_range() {
        let config = GridConfig {
            zeta_bands: 3,
            ..small_config()
        };
        let grid = WaveGrid::new(config).unwrap();
        assert_eq!(grid.profiles().len(), 3);
        let (lo, _) = grid.profile(0).unwrap().zeta_range();
        let (_, hi) = grid.profile(2).unwrap().zeta_range();
        assert_eq!(lo, grid.config().z_min);
        assert!((hi - grid.config().z_max).abs() < 1e-12);
    }

    #[test]
    fn bad_frame_delta_changes_nothing() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        let before = grid.state_hash();
        for dt in [-0.1, f32::NAN, f32::INFINITY] {
            let err = grid.tick(&TickInput::new(dt)).unwrap_err();
            assert!(matches!(err, WaveError::InvalidParameter { name: "frame_delta", .. }));
        }
        assert_eq!(grid.state_hash(), before);
        assert_eq!(grid.tick_count(), 0);
        assert_eq!(grid.state(), GridState::Ready);
    }

    #[test]
    fn zero_delta_with_empty_fields_is_idempotent() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        grid.tick(&TickInput::new(0.0)).unwrap();
        let output = grid.output().clone();
        grid.tick(&TickInput::new(0.0)).unwrap();
        assert_eq!(grid.output(), &output);
        assert_eq!(grid.time(), 100.0);
    }

    #[test]
    fn quiet_grid_stays_unchanged_over_time() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        grid.tick(&TickInput::new(0.1)).unwrap();
        let output = grid.output().clone();
        assert!(output.as_slice().iter().all(|&a| a == 0.0));
        for _ in 0..5 {
            grid.tick(&TickInput::new(0.1)).unwrap();
            assert_eq!(grid.output(), &output);
        }
        assert!((grid.time() - 100.6).abs() < 1e-9);
    }

    #[test]
    fn events_near_cell_edges_land_in_the_containing_cell() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        let heading = Vec2::from_angle(0.1);
        for x in [-15.1, 15.1, -8.1] {
            grid.add_point_direction_disturbance(Vec2::new(x, 0.1), heading, 1.0, false)
                .unwrap();
        }
        grid.tick(&TickInput::new(0.0)).unwrap();

        let angle = wavegrid_common::bucket_angle(0);
        let y = grid.cell_center(16);
        let at = |column: usize| grid.amplitude_at(Vec2::new(grid.cell_center(column), y), angle);
        for column in [0, 31, 7] {
            assert!((at(column) - 1.0).abs() < 1e-5, "column {column}: {}", at(column));
        }
        for column in [1, 6, 8, 30] {
            assert_eq!(at(column), 0.0, "column {column}");
        }
    }

    #[test]
    fn impulse_travels_one_cell_per_cfl_step() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        let bucket = 0;
        let event = DisturbanceEvent::new(
            Vec2::splat(15.5 / 32.0),
            (bucket as f32 + 0.5) / DIRECTIONS as f32,
            1.0,
        );
        assert!(grid.inject(event).unwrap());
        let (start, mass) = centre_of_mass(grid.disturbance(), bucket);
        assert_eq!(start, Vec2::splat(16.0));
        assert_eq!(mass, 1.0);

        let stats = grid.tick(&TickInput::new(1.0)).unwrap();
        assert!((stats.dt_sim - grid.cfl_timestep()).abs() < 1e-6);
        let (moved, mass) = centre_of_mass(grid.disturbance(), bucket);
        assert!((mass - 1.0).abs() < 1e-4);
        let step = moved - start;
        assert!((step - bucket_direction(bucket)).length() < 1e-3, "{step:?}");
    }

    #[test]
    fn disturbance_decays_geometrically() {
        let config = GridConfig {
            dissipation: 0.9,
            ..still_config()
        };
        let mut grid = WaveGrid::new(config).unwrap();
        grid.add_point_disturbance(Vec2::ZERO, 1.0).unwrap();
        let initial = grid.disturbance().total();
        assert!((initial - 16.0).abs() < 1e-6);
        for _ in 0..5 {
            grid.tick(&TickInput::new(0.0)).unwrap();
        }
        let expected = initial * 0.9f64.powi(5);
        assert!((grid.disturbance().total() - expected).abs() < 1e-4);
    }

    #[test]
    fn ambient_fills_from_wind_edges() {
        let config = GridConfig {
            diffusion: DiffusionKernel::NONE,
            ..small_config()
        };
        let mut grid = WaveGrid::new(config).unwrap();
        let wind = grid.default_amplitude().to_owned();
        let peak = (0..DIRECTIONS)
            .max_by(|&a, &b| wind[a].total_cmp(&wind[b]))
            .unwrap_or(0);
        for _ in 0..80 {
            grid.tick(&TickInput::new(1.0)).unwrap();
        }
        let centre = grid.output().get(16, 16, peak);
        assert!((centre - wind[peak]).abs() < 1e-3, "{centre} vs {}", wind[peak]);
        for d in 0..DIRECTIONS {
            assert!(grid.output().get(16, 16, d) <= wind.iter().cloned().fold(0.0, f32::max) + 1e-5);
        }
    }

    #[test]
    fn paused_ticks_freeze_fields_but_advance_profiles() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        grid.add_point_disturbance(Vec2::ZERO, 1.0).unwrap();
        grid.tick(&TickInput::paused(0.5)).unwrap();
        assert_eq!(grid.time(), 100.5);
        assert_eq!(grid.profile(0).unwrap().time(), 100.5);
        assert!((grid.disturbance().total() - 16.0).abs() < 1e-6);
        assert_eq!(grid.ambient().total(), 0.0);
    }

    #[test]
    fn output_padding_mirrors_interior() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        grid.add_point_disturbance(Vec2::new(-15.5, -15.5), 2.0).unwrap();
        for _ in 0..3 {
            grid.tick(&TickInput::new(0.3)).unwrap();
        }
        let out = grid.output();
        let n = out.resolution();
        for i in 0..out.side() {
            let c = i.clamp(1, n);
            assert_eq!(out.cell(i, 0), out.cell(c, 1));
            assert_eq!(out.cell(0, i), out.cell(1, c));
            assert_eq!(out.cell(i, n + 1), out.cell(c, n));
            assert_eq!(out.cell(n + 1, i), out.cell(n, c));
        }
        assert!(out.as_slice().iter().all(|&a| a >= 0.0));
    }

    #[test]
    fn out_of_domain_disturbance_is_rejected() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        assert!(!grid.add_point_disturbance(Vec2::new(40.0, 0.0), 1.0).unwrap());
        assert!(!grid.add_point_disturbance(Vec2::ZERO, f32::NAN).unwrap());
        assert!(
            !grid
                .add_point_direction_disturbance(Vec2::ZERO, Vec2::ZERO, 1.0, false)
                .unwrap()
        );
        assert_eq!(grid.disturbance().total(), 0.0);
    }

    #[test]
    fn spread_fan_conserves_magnitude() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        assert!(
            grid.add_point_direction_disturbance(Vec2::ZERO, Vec2::new(1.0, 1.0), 5.0, true)
                .unwrap()
        );
        assert!((grid.disturbance().total() - 5.0).abs() < 1e-5);

        // 0.9 rad sits inside bucket 2, away from any boundary.
        let mut narrow = WaveGrid::new(still_config()).unwrap();
        narrow
            .add_point_direction_disturbance(Vec2::ZERO, Vec2::from_angle(0.9), 5.0, false)
            .unwrap();
        assert_eq!(narrow.disturbance().get(17, 17, 2), 5.0);
        assert_eq!(narrow.disturbance().total(), 5.0);
    }

    #[test]
    fn queued_events_apply_on_next_tick() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        let sender = grid.disturbance_sender();
        let worker = std::thread::spawn(move || {
            sender.send(DisturbanceEvent::new(Vec2::splat(0.5), 0.3, 2.0));
            sender.send(DisturbanceEvent::new(Vec2::splat(3.0), 0.3, 2.0));
        });
        worker.join().unwrap();
        assert_eq!(grid.disturbance().total(), 0.0);

        let stats = grid.tick(&TickInput::new(0.0)).unwrap();
        assert_eq!(stats.events_applied, 1);
        assert_eq!(stats.events_rejected, 1);
        assert!((grid.disturbance().total() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn wind_override_refreshes_forcing() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        let wind = WindSettings {
            direction_deg: 45.0,
            amplitude: 2.0,
            domain_rotation_deg: 0.0,
        };
        grid.tick(&TickInput::new(0.1).with_wind(wind)).unwrap();
        assert_eq!(grid.wind(), wind);
        assert!((grid.default_amplitude().iter().sum::<f32>() - 2.0).abs() < 1e-5);

        let bad = WindSettings {
            amplitude: f32::NAN,
            ..wind
        };
        assert!(grid.tick(&TickInput::new(0.1).with_wind(bad)).is_err());
        assert_eq!(grid.wind(), wind);
    }

    #[test]
    fn wind_override_applies_while_paused() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        let wind = WindSettings {
            direction_deg: 45.0,
            amplitude: 2.0,
            domain_rotation_deg: 0.0,
        };
        let before = grid.ambient().clone();
        grid.tick(&TickInput::paused(0.1).with_wind(wind)).unwrap();
        assert_eq!(grid.wind(), wind);
        assert_eq!(grid.ambient(), &before);

        grid.tick(&TickInput::new(0.1)).unwrap();
        assert_eq!(grid.wind(), wind);
        assert!((grid.default_amplitude().iter().sum::<f32>() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn amplitude_query_interpolates_buckets() {
        let mut grid = WaveGrid::new(still_config()).unwrap();
        grid.add_point_direction_disturbance(Vec2::new(0.5, 0.5), Vec2::from_angle(0.1), 4.0, false)
            .unwrap();
        grid.tick(&TickInput::new(0.0)).unwrap();
        let centre = wavegrid_common::bucket_angle(0);
        assert!((grid.amplitude_at(Vec2::new(0.5, 0.5), centre) - 4.0).abs() < 1e-5);
        let between = centre + std::f32::consts::TAU / 32.0;
        assert!((grid.amplitude_at(Vec2::new(0.5, 0.5), between) - 2.0).abs() < 1e-4);
        assert_eq!(grid.amplitude_at(Vec2::new(-10.0, -10.0), centre), 0.0);
    }

    #[test]
    fn disposed_grid_rejects_work() {
        let mut grid = WaveGrid::new(small_config()).unwrap();
        grid.dispose();
        assert_eq!(grid.state(), GridState::Disposed);
        assert!(grid.output().is_released());
        assert!(matches!(
            grid.tick(&TickInput::new(0.1)),
            Err(WaveError::InvalidState { operation: "tick", state: "disposed" })
        ));
        assert!(grid.add_point_disturbance(Vec2::ZERO, 1.0).is_err());
        assert_eq!(grid.amplitude_at(Vec2::ZERO, 0.0), 0.0);
        grid.dispose();
    }

    #[test]
    fn depth_query_uses_environment() {
        let depths = vec![5.0; 16];
        let env = EnvironmentDepthField::from_depths(16.0, depths).unwrap();
        let grid = WaveGrid::with_environment(small_config(), env).unwrap();
        assert_eq!(grid.depth_at(Vec2::ZERO), 5.0);

        let mismatched = EnvironmentDepthField::open_water(8.0).unwrap();
        assert!(WaveGrid::with_environment(small_config(), mismatched).is_err());
    }
}
