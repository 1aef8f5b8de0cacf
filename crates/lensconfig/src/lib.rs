use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LENS_SIZE: f32 = 0.4;
pub const DEFAULT_LENS_BULGE: f32 = 0.5;
pub const DEFAULT_ABERRATION_STRENGTH: f32 = 0.03;
pub const DEFAULT_MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    #[default]
    Auto,
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub image_path: PathBuf,
    #[serde(default)]
    pub lens: LensSection,
    #[serde(default)]
    pub surface: SurfaceSection,
    #[serde(default)]
    pub preloader: PreloaderSection,
    #[serde(default)]
    pub audio: AudioSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LensSection {
    #[serde(default = "default_lens_size")]
    pub size: f32,
    #[serde(default = "default_lens_bulge")]
    pub bulge: f32,
    #[serde(default = "default_aberration_strength")]
    pub aberration_strength: f32,
}

impl Default for LensSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_LENS_SIZE,
            bulge: DEFAULT_LENS_BULGE,
            aberration_strength: DEFAULT_ABERRATION_STRENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SurfaceSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_device_pixel_ratio")]
    pub max_device_pixel_ratio: f64,
    #[serde(default)]
    pub color_space: ColorSpaceSetting,
}

impl Default for SurfaceSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_device_pixel_ratio: DEFAULT_MAX_DEVICE_PIXEL_RATIO,
            color_space: ColorSpaceSetting::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PreloaderSection {
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval: Duration,
    #[serde(default = "default_max_step")]
    pub max_step: u8,
    #[serde(default = "default_hold_at")]
    pub hold_at: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PreloaderSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_step: default_max_step(),
            hold_at: default_hold_at(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AudioSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_lens_size() -> f32 {
    DEFAULT_LENS_SIZE
}

fn default_lens_bulge() -> f32 {
    DEFAULT_LENS_BULGE
}

fn default_aberration_strength() -> f32 {
    DEFAULT_ABERRATION_STRENGTH
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

fn default_max_device_pixel_ratio() -> f64 {
    DEFAULT_MAX_DEVICE_PIXEL_RATIO
}

fn default_interval() -> Duration {
    Duration::from_millis(80)
}

fn default_max_step() -> u8 {
    8
}

fn default_hold_at() -> u8 {
    90
}

fn default_true() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl Config {
    /// Builds a configuration around `image_path` with every other field defaulted.
    pub fn with_image(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            lens: LensSection::default(),
            surface: SurfaceSection::default(),
            preloader: PreloaderSection::default(),
            audio: AudioSection::default(),
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: Config = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reads a config file; a relative `image_path` is anchored at the file's directory.
    ///
    /// Validation is left to the caller so CLI overrides can be applied first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents)?;
        if config.image_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.image_path = parent.join(&config.image_path);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("image_path must not be empty".into()));
        }

        let lens = &self.lens;
        if !lens.size.is_finite() || lens.size <= 0.0 || lens.size >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "lens.size must lie in (0, 1); got {}",
                lens.size
            )));
        }
        if !lens.bulge.is_finite() || lens.bulge <= 0.0 || lens.bulge > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "lens.bulge must lie in (0, 1]; got {}",
                lens.bulge
            )));
        }
        if !lens.aberration_strength.is_finite() || lens.aberration_strength < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lens.aberration_strength must be >= 0; got {}",
                lens.aberration_strength
            )));
        }

        let surface = &self.surface;
        if surface.width == 0 || surface.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be greater than zero; got {}x{}",
                surface.width, surface.height
            )));
        }
        if !surface.max_device_pixel_ratio.is_finite() || surface.max_device_pixel_ratio < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "surface.max_device_pixel_ratio must be >= 1; got {}",
                surface.max_device_pixel_ratio
            )));
        }

        let preloader = &self.preloader;
        if preloader.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "preloader.interval must be greater than zero".into(),
            ));
        }
        if preloader.max_step == 0 {
            return Err(ConfigError::Invalid(
                "preloader.max_step must be greater than zero".into(),
            ));
        }
        if !(1..=99).contains(&preloader.hold_at) {
            return Err(ConfigError::Invalid(format!(
                "preloader.hold_at must lie in 1..=99; got {}",
                preloader.hold_at
            )));
        }

        Ok(())
    }
}
