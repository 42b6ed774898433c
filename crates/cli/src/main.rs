#![deny(unsafe_code)]
//! Headless preview tool for the backdrop particle field.
//!
//! Subcommands:
//! - `simulate`: run N frames and write a PNG of the last one
//! - `sprite`: write the point sprite as a PNG
//! - `config`: print the resolved options as JSON
//! - `schema`: print the option schema as JSON

mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

use backdrop_core::theme::{ColorMode, ACCENT_PROPERTY, PRIMARY_PROPERTY};
use backdrop_core::{Animation, Backdrop, BackdropConfig, SpriteImage, Srgb};
use clap::{Args, Parser, Subcommand};
use error::CliError;

#[derive(Parser)]
#[command(name = "backdrop", about = "Curl-noise particle background preview")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Option sources shared by every subcommand that builds a config.
#[derive(Args, Default)]
struct ConfigArgs {
    /// JSON options file (camelCase keys, any subset).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles.
    #[arg(long)]
    count: Option<usize>,

    /// Field-to-velocity multiplier.
    #[arg(long)]
    speed: Option<f64>,

    /// Point size in world units.
    #[arg(long)]
    dot_size: Option<f64>,

    /// Additive blending (true) or normal blending (false).
    #[arg(long)]
    glow: Option<bool>,

    /// mix, primary, or accent.
    #[arg(long)]
    color_mode: Option<ColorMode>,

    /// Noise seed.
    #[arg(long)]
    noise_seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate N frames and write the final frame as a PNG.
    Simulate {
        #[command(flatten)]
        options: ConfigArgs,

        /// Image width in pixels.
        #[arg(short = 'W', long, default_value_t = 1280)]
        width: u32,

        /// Image height in pixels.
        #[arg(short = 'H', long, default_value_t = 720)]
        height: u32,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 300)]
        frames: usize,

        /// Simulated display refresh rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Seed for initial particle placement.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Value of --color-primary in the simulated page.
        #[arg(long)]
        primary: Option<String>,

        /// Value of --color-accent in the simulated page.
        #[arg(long)]
        accent: Option<String>,

        /// Page background behind the particles.
        #[arg(long, default_value = "#0a0a0a")]
        background: String,

        /// Output file path.
        #[arg(short, long, default_value = "backdrop.png")]
        output: PathBuf,
    },
    /// Write the point sprite as a PNG.
    Sprite {
        /// Edge length in pixels.
        #[arg(long, default_value_t = 64)]
        size: u32,

        #[arg(short, long, default_value = "sprite.png")]
        output: PathBuf,
    },
    /// Print the resolved options.
    Config {
        #[command(flatten)]
        options: ConfigArgs,
    },
    /// Print the option schema.
    Schema,
}

fn read_config_file(path: &Path) -> Result<BackdropConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    Ok(BackdropConfig::from_json_str(&text)?)
}

/// File options first, then flag overrides, then validation.
fn resolve_config(args: &ConfigArgs) -> Result<BackdropConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => BackdropConfig::default(),
    };
    if let Some(count) = args.count {
        config.count = count;
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(dot_size) = args.dot_size {
        config.dot_size = dot_size;
    }
    if let Some(glow) = args.glow {
        config.glow = glow;
    }
    if let Some(mode) = args.color_mode {
        config.color_mode = mode;
    }
    if args.noise_seed.is_some() {
        config.seed = args.noise_seed;
    }
    config.validate()?;
    Ok(config)
}

fn theme_source(primary: Option<String>, accent: Option<String>) -> HashMap<String, String> {
    [(PRIMARY_PROPERTY, primary), (ACCENT_PROPERTY, accent)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
}

/// Runs `frames` frames at a fixed `fps`, as a display loop would.
fn simulate(animation: &mut dyn Animation, frames: usize, fps: f64) -> Result<(), CliError> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(CliError::Input(format!("--fps must be positive, got {fps}")));
    }
    let dt = 1.0 / fps;
    for frame in 1..=frames {
        animation.frame(dt, frame as f64 * dt);
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Simulate {
            options,
            width,
            height,
            frames,
            fps,
            seed,
            primary,
            accent,
            background,
            output,
        } => {
            let config = resolve_config(&options)?;
            let background = Srgb::from_css(&background)?;
            let theme = theme_source(primary, accent);
            let mut backdrop = Backdrop::new(config, &theme, seed)?;
            simulate(&mut backdrop, frames, fps)?;
            let raster = backdrop_raster::render_frame(&backdrop, width, height, background)?;
            backdrop_raster::snapshot::write_png(&raster, &output)?;

            if cli.json {
                print_json(&serde_json::json!({
                    "width": width,
                    "height": height,
                    "frames": frames,
                    "fps": fps,
                    "seed": seed,
                    "color": backdrop.theme().color_string(backdrop.config().color_mode),
                    "config": backdrop.config().to_json(),
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!(
                    "simulated {} particles ({width}x{height}, {frames} frames @ {fps} fps, seed {seed}) -> {}",
                    backdrop.store().len(),
                    output.display()
                );
            }
        }
        Command::Sprite { size, output } => {
            let sprite = SpriteImage::circle(size)?;
            backdrop_raster::snapshot::write_sprite_png(&sprite, &output)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "size": size,
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!("sprite {size}x{size} -> {}", output.display());
            }
        }
        Command::Config { options } => {
            let config = resolve_config(&options)?;
            print_json(&config.to_json())?;
        }
        Command::Schema => {
            print_json(&BackdropConfig::param_schema())?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose > 0 {
        logger.filter_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }
    logger.init();

    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        log::debug!("command failed: {e:?}");
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("backdrop").chain(args.iter().copied())).unwrap()
    }

    fn config_args(cli: Cli) -> ConfigArgs {
        match cli.command {
            Command::Config { options } | Command::Simulate { options, .. } => options,
            _ => panic!("no config args"),
        }
    }

    #[test]
    fn no_flags_resolve_to_defaults() {
        let config = resolve_config(&ConfigArgs::default()).unwrap();
        assert_eq!(config, BackdropConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = config_args(parse(&[
            "config",
            "--count",
            "500",
            "--glow",
            "false",
            "--color-mode",
            "primary",
            "--dot-size",
            "0.055",
        ]));
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.count, 500);
        assert!(!config.glow);
        assert_eq!(config.color_mode, ColorMode::Primary);
        assert_eq!(config.dot_size, 0.055);
    }

    #[test]
    fn unknown_color_mode_is_a_parse_error() {
        let result = Cli::try_parse_from(["backdrop", "config", "--color-mode", "neon"]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_override_is_an_input_error() {
        let args = config_args(parse(&["config", "--count", "0"]));
        let err = resolve_config(&args).unwrap_err();
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn config_file_is_read_then_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"count": 64, "speed": 0.03}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let args = config_args(parse(&["config", "--config", &path, "--speed", "0.025"]));
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.count, 64);
        assert_eq!(config.speed, 0.025);
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/backdrop.json")),
            ..Default::default()
        };
        assert_eq!(resolve_config(&args).unwrap_err().exit_code(), 11);
    }

    #[test]
    fn theme_source_only_holds_given_properties() {
        let theme = theme_source(Some("#ff0000".into()), None);
        assert_eq!(theme.len(), 1);
        assert_eq!(theme.get(PRIMARY_PROPERTY).map(String::as_str), Some("#ff0000"));
    }

    #[test]
    fn simulate_rejects_non_positive_fps() {
        let mut backdrop =
            Backdrop::new(BackdropConfig { count: 4, ..Default::default() }, &theme_source(None, None), 1)
                .unwrap();
        let before = backdrop.positions().to_vec();
        assert_eq!(simulate(&mut backdrop, 1, 0.0).unwrap_err().exit_code(), 12);
        assert_eq!(backdrop.positions(), &before[..]);
        assert!(simulate(&mut backdrop, 10, 60.0).is_ok());
        assert_ne!(backdrop.positions(), &before[..]);
    }

    #[test]
    fn simulate_and_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frame.png");
        let cli = parse(&[
            "simulate",
            "--count",
            "50",
            "--frames",
            "5",
            "-W",
            "64",
            "-H",
            "36",
            "-o",
            output.to_str().unwrap(),
        ]);
        run(cli).unwrap();
        assert!(output.exists());
    }
}
