use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lensconfig::ColorSpaceSetting;

#[derive(Parser, Debug)]
#[command(
    name = "lensfx",
    author,
    version,
    about = "Full-window lens effect that follows the pointer over a background image"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Settings shared by every subcommand; each one overrides the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Configuration file (defaults to `lensfx.toml` in the config directory).
    #[arg(long, short, value_name = "PATH", env = "LENSFX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Background image; enough on its own when no config file exists.
    #[arg(long, value_name = "PATH", global = true)]
    pub image: Option<PathBuf>,

    /// Lens radius as a fraction of the viewport height, in (0, 1).
    #[arg(long, value_name = "FRACTION", global = true)]
    pub lens_size: Option<f32>,

    /// Distortion strength in (0, 1].
    #[arg(long, value_name = "AMOUNT", global = true)]
    pub bulge: Option<f32>,

    /// Chromatic aberration strength (>= 0).
    #[arg(long, value_name = "AMOUNT", global = true)]
    pub aberration: Option<f32>,

    /// Window size for the lens window, or output size for `snapshot` (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size, global = true)]
    pub size: Option<(u32, u32)>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space, global = true)]
    pub color_space: Option<ColorSpaceSetting>,

    /// Disable hover and click sound cues.
    #[arg(long, global = true)]
    pub mute: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and print the effective settings.
    Check,
    /// Render one frame on the CPU and write it as a PNG.
    Snapshot(SnapshotArgs),
    /// Print the resolved config directory and default config file.
    Where,
}

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Destination PNG.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Lens center in normalized coordinates, origin bottom-left (e.g. `0.3,0.6`).
    #[arg(long, value_name = "X,Y", value_parser = parse_mouse)]
    pub mouse: Option<(f32, f32)>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x800".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}' in size specification", width.trim()))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}' in size specification", height.trim()))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceSetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceSetting::Auto),
        "gamma" | "srgb-off" => Ok(ColorSpaceSetting::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceSetting::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_mouse(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .trim()
        .split_once(',')
        .ok_or_else(|| "expected X,Y format, e.g. 0.5,0.5".to_string())?;
    let parse = |raw: &str| -> Result<f32, String> {
        let parsed: f32 = raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid coordinate '{}'", raw.trim()))?;
        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(format!("coordinate '{}' must be finite", raw.trim()))
        }
    };
    Ok((parse(x)?, parse(y)?))
}
