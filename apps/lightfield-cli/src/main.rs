use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use lightfield_kernel::{BoxField, RegimeCounts, SceneConfig};
use lightfield_render::{DebugTextSurface, FixedFrames, FrameDriver, FrameSource, ManualClock};
use lightfield_tools::FieldInspector;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lightfield-cli", about = "Headless lightfield runs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML scene configuration; defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Drive the field for a number of frames against a text surface
    Simulate {
        /// Number of frames to draw
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Fixed frame delta in seconds
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// RNG seed for reproducible generation
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Exact box count, overriding the configured range
        #[arg(long)]
        count: Option<usize>,
        /// Light position as three numbers
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        light: Option<Vec<f32>>,
        /// Move the light on a circle of this radius instead
        #[arg(long, conflicts_with = "light")]
        orbit: Option<f32>,
        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
        /// Number of boxes listed in the last text frame
        #[arg(long, default_value = "0")]
        list: usize,
    },
    /// Run the same scene twice and compare the final state
    Determinism {
        #[arg(short, long, default_value = "300")]
        frames: u64,
        #[arg(short, long, default_value = "7")]
        seed: u64,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// JSON summary of a headless run.
#[derive(Debug, Serialize)]
struct RunSummary {
    frames: u64,
    seed: u64,
    boxes: usize,
    generation: u64,
    light: [f32; 3],
    attraction: usize,
    hysteresis: usize,
    return_to_origin: usize,
    displaced: usize,
    state_hash: String,
}

impl RunSummary {
    fn new(field: &BoxField, frames: u64, seed: u64) -> Self {
        let summary = FieldInspector::summary(field);
        let RegimeCounts {
            attraction,
            hysteresis,
            return_to_origin,
        } = summary.regimes;
        Self {
            frames,
            seed,
            boxes: summary.instance_count,
            generation: summary.generation,
            light: summary.light_position.to_array(),
            attraction,
            hysteresis,
            return_to_origin,
            displaced: FieldInspector::displaced(field, 1e-4).len(),
            state_hash: format!("{:#018x}", field.state_hash()),
        }
    }
}

/// Moves the light around the z axis, one full turn every `period` frames.
struct OrbitingLight {
    frames: u64,
    radius: f32,
    period: u64,
}

impl FrameSource for OrbitingLight {
    fn next_frame(&mut self, frame: u64, config: &mut SceneConfig) -> bool {
        if frame >= self.frames {
            return false;
        }
        let angle = std::f32::consts::TAU * (frame % self.period) as f32 / self.period as f32;
        let z = config.light().position.z;
        let position = Vec3::new(angle.cos() * self.radius, angle.sin() * self.radius, z);
        if let Err(e) = config.set_light_position(position) {
            tracing::warn!("orbit rejected light position: {e}");
            return false;
        }
        true
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

/// Build a field and drive it for `frames` against a text surface.
fn run(
    config: &mut SceneConfig,
    seed: u64,
    count: Option<usize>,
    dt: f32,
    frames: &mut dyn FrameSource,
    list: usize,
) -> anyhow::Result<(BoxField, DebugTextSurface, u64)> {
    let mut field = match count {
        Some(count) => BoxField::with_count(config, count, seed),
        None => BoxField::new(config, Some(seed)),
    };
    let mut surface = DebugTextSurface::new(list);
    let mut driver = FrameDriver::new(ManualClock::fixed(dt));
    let drawn = driver.run(&mut field, config, &mut surface, frames)?;
    Ok((field, surface, drawn))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    let filter = if cli.verbose || config.dev().log {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("lightfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "kernel: boxes {}..={}",
                config.generative().box_count.min,
                config.generative().box_count.max
            );
            println!("render: {}", lightfield_render::crate_info());
            println!("tools: {}", lightfield_tools::crate_info());
        }
        Commands::Simulate {
            frames,
            dt,
            seed,
            count,
            light,
            orbit,
            json,
            list,
        } => {
            if let Some(light) = light {
                config.set_light_position(Vec3::new(light[0], light[1], light[2]))?;
            }
            let mut source: Box<dyn FrameSource> = match orbit {
                Some(radius) => Box::new(OrbitingLight {
                    frames,
                    radius,
                    period: 240,
                }),
                None => Box::new(FixedFrames(frames)),
            };
            let (field, surface, drawn) =
                run(&mut config, seed, count, dt, source.as_mut(), list)?;
            let summary = RunSummary::new(&field, drawn, seed);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                if list > 0 {
                    print!("{}", surface.last_frame());
                }
                println!("{}", FieldInspector::summary(&field));
                println!(
                    "Displaced: {}  Hash: {}",
                    summary.displaced, summary.state_hash
                );
            }
        }
        Commands::Determinism { frames, seed } => {
            println!("Determinism check: seed={seed}, frames={frames}");
            let mut hashes = Vec::with_capacity(2);
            for _ in 0..2 {
                let mut scene = config.clone();
                let mut source = OrbitingLight {
                    frames,
                    radius: 1.0,
                    period: 120,
                };
                let (field, _, _) = run(&mut scene, seed, None, 1.0 / 60.0, &mut source, 0)?;
                hashes.push(field.state_hash());
            }
            let matched = hashes[0] == hashes[1];
            println!("Run 1: {:#018x}", hashes[0]);
            println!("Run 2: {:#018x}", hashes[1]);
            println!("Match: {}", if matched { "OK" } else { "MISMATCH" });
            if !matched {
                anyhow::bail!("runs diverged");
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_moves_light_and_stops() {
        let mut config = SceneConfig::default();
        let mut source = OrbitingLight {
            frames: 2,
            radius: 2.0,
            period: 4,
        };
        assert!(source.next_frame(0, &mut config));
        assert!(config.light().position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert!(source.next_frame(1, &mut config));
        assert!(config.light().position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
        assert!(!source.next_frame(2, &mut config));
    }

    #[test]
    fn run_summary_reflects_field() {
        let mut config = SceneConfig::default();
        let (field, surface, drawn) =
            run(&mut config, 3, Some(25), 0.016, &mut FixedFrames(10), 0).unwrap();
        let summary = RunSummary::new(&field, drawn, 3);
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.boxes, 25);
        assert_eq!(summary.generation, 1);
        assert_eq!(
            summary.attraction + summary.hysteresis + summary.return_to_origin,
            25
        );
        assert!(surface.is_disposed());
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::parse_from([
            "lightfield-cli",
            "simulate",
            "--frames",
            "5",
            "--light",
            "0",
            "-1.5",
            "0",
            "--json",
        ]);
        match cli.command {
            Commands::Simulate {
                frames, light, json, ..
            } => {
                assert_eq!(frames, 5);
                assert_eq!(light, Some(vec![0.0, -1.5, 0.0]));
                assert!(json);
            }
            _ => panic!("expected simulate"),
        }
    }
}
