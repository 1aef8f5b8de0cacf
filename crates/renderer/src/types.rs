use std::path::PathBuf;

use glam::Vec2;

/// Fraction of the remaining gap the smoothed pointer closes each tick.
pub const SMOOTHING_FACTOR: f32 = 0.1;

const _: () = assert!(SMOOTHING_FACTOR > 0.0 && SMOOTHING_FACTOR < 1.0);

/// Resting lens position: the middle of the viewport.
pub const LENS_CENTER: Vec2 = Vec2::splat(0.5);

/// Amount the animation clock advances on every tick that pushes parameters.
pub const TIME_STEP: f64 = 0.01;

/// Upper bound on the device pixel ratio used to size the drawable buffer.
pub const DEFAULT_MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Gamma-encoded swapchain, matching how browsers composite images.
    #[default]
    Auto,
    /// Treat image texels and outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Decode image texels to linear and let an sRGB swapchain re-encode.
    Linear,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("lens size must lie in (0, 1); got {0}")]
    LensSize(f32),
    #[error("bulge must lie in (0, 1]; got {0}")]
    Bulge(f32),
    #[error("aberration strength must be finite and >= 0; got {0}")]
    Aberration(f32),
}

/// Fixed lens configuration shared by the CPU reference and the GPU shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    lens_size: f32,
    bulge: f32,
    aberration_strength: f32,
}

impl ShaderParams {
    pub fn new(lens_size: f32, bulge: f32, aberration_strength: f32) -> Result<Self, ParamsError> {
        if !lens_size.is_finite() || lens_size <= 0.0 || lens_size >= 1.0 {
            return Err(ParamsError::LensSize(lens_size));
        }
        if !bulge.is_finite() || bulge <= 0.0 || bulge > 1.0 {
            return Err(ParamsError::Bulge(bulge));
        }
        if !aberration_strength.is_finite() || aberration_strength < 0.0 {
            return Err(ParamsError::Aberration(aberration_strength));
        }
        Ok(Self {
            lens_size,
            bulge,
            aberration_strength,
        })
    }

    pub fn lens_size(&self) -> f32 {
        self.lens_size
    }

    pub fn bulge(&self) -> f32 {
        self.bulge
    }

    pub fn aberration_strength(&self) -> f32 {
        self.aberration_strength
    }
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            lens_size: 0.4,
            bulge: 0.5,
            aberration_strength: 0.03,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Background image decoded by the asset bootstrap.
    pub image_path: PathBuf,
    /// Lens parameters, validated before the renderer is built.
    pub params: ShaderParams,
    /// Cap applied to the window scale factor when sizing the drawable buffer.
    pub max_device_pixel_ratio: f64,
    /// Desired color handling for swapchain/textures.
    pub color_space: ColorSpaceMode,
    /// Base window title; collaborators may append status text.
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 800),
            image_path: PathBuf::new(),
            params: ShaderParams::default(),
            max_device_pixel_ratio: DEFAULT_MAX_DEVICE_PIXEL_RATIO,
            color_space: ColorSpaceMode::default(),
            title: "lensfx".to_string(),
        }
    }
}
