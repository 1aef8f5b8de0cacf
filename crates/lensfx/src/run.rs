use std::time::Instant;

use anyhow::{bail, Context, Result};
use lensconfig::{ColorSpaceSetting, Config};
use preloader::Preloader;
use renderer::{ColorSpaceMode, Renderer, RendererConfig, ShaderParams, Vec2, LENS_CENTER};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, RunArgs, SnapshotArgs};
use crate::feedback::{BellPlayer, LensObserver};
use crate::paths::AppPaths;
use crate::snapshot::write_snapshot;

const WINDOW_TITLE: &str = "lensfx";

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved lensfx paths");

    match cli.command {
        Some(Command::Where) => {
            println!("config dir:  {}", paths.config_dir().display());
            println!("config file: {}", paths.config_file().display());
            Ok(())
        }
        Some(Command::Check) => {
            let config = resolve_config(&cli.run, &paths)?;
            print_summary(&config);
            Ok(())
        }
        Some(Command::Snapshot(args)) => {
            let config = resolve_config(&cli.run, &paths)?;
            snapshot(&config, &args)
        }
        None => {
            let config = resolve_config(&cli.run, &paths)?;
            launch(&config)
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (explicit or default), applies CLI overrides, validates.
fn resolve_config(args: &RunArgs, paths: &AppPaths) -> Result<Config> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| paths.config_file());

    let mut config = if args.config.is_some() || path.exists() {
        let config = Config::load(&path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        config
    } else if let Some(image) = &args.image {
        tracing::debug!(
            path = %path.display(),
            "no configuration file; using defaults around --image"
        );
        Config::with_image(image.clone())
    } else {
        bail!(
            "no configuration found at {}; pass --config or --image",
            path.display()
        );
    };

    apply_overrides(&mut config, args);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(image) = &args.image {
        config.image_path = image.clone();
    }
    if let Some(size) = args.lens_size {
        config.lens.size = size;
    }
    if let Some(bulge) = args.bulge {
        config.lens.bulge = bulge;
    }
    if let Some(aberration) = args.aberration {
        config.lens.aberration_strength = aberration;
    }
    if let Some((width, height)) = args.size {
        config.surface.width = width;
        config.surface.height = height;
    }
    if let Some(color_space) = args.color_space {
        config.surface.color_space = color_space;
    }
    if args.mute {
        config.audio.enabled = false;
    }
}

fn shader_params(config: &Config) -> Result<ShaderParams> {
    ShaderParams::new(
        config.lens.size,
        config.lens.bulge,
        config.lens.aberration_strength,
    )
    .context("invalid lens parameters")
}

fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

fn renderer_config(config: &Config) -> Result<RendererConfig> {
    Ok(RendererConfig {
        surface_size: (config.surface.width, config.surface.height),
        image_path: config.image_path.clone(),
        params: shader_params(config)?,
        max_device_pixel_ratio: config.surface.max_device_pixel_ratio,
        color_space: map_color_space(config.surface.color_space),
        title: WINDOW_TITLE.to_string(),
    })
}

fn print_summary(config: &Config) {
    let image_state = if config.image_path.is_file() {
        "found"
    } else {
        "missing"
    };
    println!("image_path          = {} ({image_state})", config.image_path.display());
    println!("lens_size           = {}", config.lens.size);
    println!("bulge               = {}", config.lens.bulge);
    println!("aberration_strength = {}", config.lens.aberration_strength);
    println!(
        "surface             = {}x{} (max device pixel ratio {})",
        config.surface.width, config.surface.height, config.surface.max_device_pixel_ratio
    );
    println!("color_space         = {:?}", config.surface.color_space);
    println!(
        "preloader           = every {} up to {} (hold at {}%)",
        humantime::format_duration(config.preloader.interval),
        config.preloader.max_step,
        config.preloader.hold_at
    );
    println!(
        "audio               = {}",
        if config.audio.enabled { "on" } else { "off" }
    );
}

fn snapshot(config: &Config, args: &SnapshotArgs) -> Result<()> {
    let params = shader_params(config)?;
    let mouse = args
        .mouse
        .map(|(x, y)| Vec2::new(x, y))
        .unwrap_or(LENS_CENTER);
    write_snapshot(
        &config.image_path,
        &args.output,
        (config.surface.width, config.surface.height),
        mouse,
        &params,
    )
}

fn launch(config: &Config) -> Result<()> {
    let renderer_config = renderer_config(config)?;
    let preloader = Preloader::new(&config.preloader, Instant::now())
        .context("invalid preloader settings")?;
    let observer = LensObserver::new(preloader, BellPlayer::stderr(config.audio.enabled));

    tracing::info!(
        image = %config.image_path.display(),
        lens_size = config.lens.size,
        bulge = config.lens.bulge,
        aberration = config.lens.aberration_strength,
        "starting lensfx"
    );
    Renderer::new(renderer_config).run(observer)
}
