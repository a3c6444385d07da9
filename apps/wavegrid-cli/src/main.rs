use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wavegrid_common::{DIRECTIONS, bucket_angle};
use wavegrid_forcing::default_amplitude;
use wavegrid_kernel::{BackendKind, GridConfig, TickInput, TickStats, WaveGrid};
use wavegrid_spectrum::{
    DEFAULT_GROUP_SPEED_CORRECTION, PiersonMoskowitz, ProfileBuffer, ProfileSettings, Quadrature,
    Spectrum, group_speed,
};

#[derive(Parser)]
#[command(name = "wavegrid-cli", about = "CLI tool for wavegrid operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Sequential,
    Parallel,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sequential => BackendKind::Sequential,
            BackendArg::Parallel => BackendKind::Parallel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Tabulate the wind-sea spectrum and its group speed
    Spectrum {
        /// Wind speed at 19.4 m, m/s
        #[arg(short, long, default_value = "10")]
        wind_speed: f64,
        /// Number of table rows
        #[arg(short, long, default_value = "12")]
        rows: usize,
        /// Quadrature nodes for the group-speed integral
        #[arg(short, long, default_value = "96")]
        nodes: usize,
    },
    /// Print the 16-direction wind forcing vector
    Forcing {
        /// Wind direction, degrees
        #[arg(short, long, default_value = "0")]
        direction: f32,
        /// Total amplitude
        #[arg(short, long, default_value = "1")]
        amplitude: f32,
        /// Domain rotation, degrees
        #[arg(short, long, default_value = "0")]
        rotation: f32,
    },
    /// Synthesize a profile buffer and print its shape
    Profile {
        #[arg(short, long, default_value = "10")]
        wind_speed: f64,
        /// Simulation time, seconds
        #[arg(short, long, default_value = "100")]
        time: f64,
        #[arg(short, long, default_value = "4096")]
        resolution: usize,
        /// Evenly spaced samples to print
        #[arg(short, long, default_value = "8")]
        samples: usize,
    },
    /// Run a headless simulation with synthetic rain
    Run {
        /// YAML grid configuration; defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured backend
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Frame delta, seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// RNG seed for the rain
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Raindrops per tick
        #[arg(long, default_value = "4")]
        drops: usize,
        /// Magnitude of each raindrop
        #[arg(long, default_value = "0.05")]
        magnitude: f32,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default grid configuration as YAML
    Config,
}

/// Deterministic raindrop positions.
struct Rain {
    state: u64,
}

impl Rain {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_unit(&mut self) -> f32 {
        self.state = splitmix64(self.state);
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform point in `[-half, half)²`.
    fn drop_at(&mut self, half: f32) -> Vec2 {
        let x = self.next_unit();
        let y = self.next_unit();
        (Vec2::new(x, y) * 2.0 - 1.0) * half
    }
}

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[derive(Serialize)]
struct RunReport {
    backend: &'static str,
    resolution: usize,
    ticks: u64,
    seed: u64,
    group_speed: f32,
    cfl_timestep: f32,
    events_applied: usize,
    events_rejected: usize,
    mean_tick: Duration,
    state_hash: String,
    last: TickStats,
}

/// Average tick time; zero ticks count as one.
fn mean_tick(busy: Duration, ticks: u64) -> Duration {
    busy.div_f64(ticks.max(1) as f64)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: GridConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        resolution = config.resolution,
        backend = ?config.backend,
        "loaded grid configuration"
    );
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("wavegrid-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", wavegrid_common::crate_info());
            println!("spectrum: {}", wavegrid_spectrum::crate_info());
            println!("forcing: {}", wavegrid_forcing::crate_info());
            println!("kernel: {}", wavegrid_kernel::crate_info());
            println!("directions: {DIRECTIONS}");
        }
        Commands::Spectrum {
            wind_speed,
            rows,
            nodes,
        } => {
            let spectrum = PiersonMoskowitz::new(wind_speed)?;
            let defaults = GridConfig::default();
            let quadrature = Quadrature::new(defaults.z_min, defaults.z_max, nodes)?;
            let speed = group_speed(&spectrum, &quadrature, DEFAULT_GROUP_SPEED_CORRECTION)?;

            println!("Pierson-Moskowitz, wind {wind_speed} m/s");
            println!("{:>10} {:>12} {:>14}", "zeta", "wavelength", "density");
            let table = Quadrature::new(defaults.z_min, defaults.z_max, rows.max(1))?;
            for z in table.points() {
                println!("{z:>10.4} {:>12.4} {:>14.6e}", z.exp2(), spectrum.density(z));
            }
            println!("group speed: {speed:.6} m/s ({nodes} nodes)");
        }
        Commands::Forcing {
            direction,
            amplitude,
            rotation,
        } => {
            let forcing = default_amplitude(direction, rotation, amplitude);
            println!("Wind {direction} deg, rotation {rotation} deg, amplitude {amplitude}");
            for (b, value) in forcing.iter().enumerate() {
                println!("  bucket {b:>2} ({:>6.2} deg): {value:.6}", bucket_angle(b).to_degrees());
            }
        }
        Commands::Profile {
            wind_speed,
            time,
            resolution,
            samples,
        } => {
            let defaults = GridConfig::default();
            let spectrum = PiersonMoskowitz::new(wind_speed)?;
            let settings = ProfileSettings {
                resolution,
                ..ProfileSettings::default()
            };
            let mut buffer = ProfileBuffer::new(
                defaults.z_min,
                defaults.z_max,
                settings,
                &spectrum,
                DEFAULT_GROUP_SPEED_CORRECTION,
            )?;
            buffer.precompute(time);

            let (lo, hi) = buffer
                .samples()
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), s| {
                    (lo.min(s.vertical), hi.max(s.vertical))
                });
            println!(
                "Profile: period={:.4} m, group speed={:.4} m/s, t={time}",
                buffer.period(),
                buffer.group_speed()
            );
            println!("vertical range: [{lo:.5}, {hi:.5}]");
            let count = samples.max(1);
            for i in 0..count {
                let p = buffer.period() * i as f64 / count as f64;
                let s = buffer.sample(p);
                println!(
                    "  p={p:>8.4}: dx={:>9.5} dy={:>9.5} dx'={:>9.5} dy'={:>9.5}",
                    s.horizontal, s.vertical, s.horizontal_slope, s.vertical_slope
                );
            }
        }
        Commands::Run {
            config,
            backend,
            ticks,
            dt,
            seed,
            drops,
            magnitude,
            json,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(backend) = backend {
                config.backend = backend.into();
            }
            let half = config.domain_half_size;
            let resolution = config.resolution;
            let mut grid = WaveGrid::new(config)?;
            let mut rain = Rain::new(seed);
            let input = TickInput::new(dt);

            let mut applied = 0;
            let mut rejected = 0;
            let mut busy = Duration::ZERO;
            let mut last = TickStats::default();
            for _ in 0..ticks {
                for _ in 0..drops {
                    if grid.add_point_disturbance(rain.drop_at(half), magnitude)? {
                        applied += 1;
                    } else {
                        rejected += 1;
                    }
                }
                last = grid.tick(&input)?;
                busy += last.elapsed;
            }

            let report = RunReport {
                backend: grid.backend_name(),
                resolution,
                ticks,
                seed,
                group_speed: grid.group_speed(),
                cfl_timestep: grid.cfl_timestep(),
                events_applied: applied,
                events_rejected: rejected,
                mean_tick: mean_tick(busy, ticks),
                state_hash: format!("{:#018x}", grid.state_hash()),
                last,
            };
            grid.dispose();
            tracing::debug!(applied, rejected, "run finished");

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Run: backend={}, {}x{}, ticks={}, seed={}",
                    report.backend, resolution, resolution, ticks, seed
                );
                println!(
                    "group speed={:.4} m/s, cfl timestep={:.4} s",
                    report.group_speed, report.cfl_timestep
                );
                println!(
                    "drops: applied={}, rejected={}",
                    report.events_applied, report.events_rejected
                );
                println!(
                    "energy: ambient={:.4}, disturbance={:.4}",
                    report.last.ambient_energy, report.last.disturbance_energy
                );
                println!("mean tick: {:?}", report.mean_tick);
                println!("state hash: {}", report.state_hash);
            }
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&GridConfig::default())?);
        }
    }

    Ok(())
}
