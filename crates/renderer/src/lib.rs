//! Renderer crate for lensfx.
//!
//! A full-window background image seen through a circular lens that follows
//! the smoothed pointer, with fisheye-style distortion and chromatic
//! aberration. The overall flow is:
//!
//! ```text
//!   lensfx CLI
//!        │ RendererConfig + FrameObserver
//!        ▼
//!   Renderer::run ──▶ winit event loop ──▶ FrameLoop::tick ──▶ GpuState::render
//!        │                  ▲                    │
//!        │                  │ AssetReady         └─▶ push_params ─▶ GPU UBO
//!        └─▶ AssetBootstrap ┘ (worker thread decodes the image)
//! ```
//!
//! The pure pieces (`pointer`, `lens`, `frame`, `surface`) carry no GPU state
//! and are tested directly. `lens` also renders stills on the CPU.

pub mod assets;
mod compile;
pub mod frame;
mod gpu;
pub mod hooks;
pub mod lens;
pub mod pointer;
pub mod surface;
mod types;
mod window;

use anyhow::Result;

pub use assets::{AssetBootstrap, AssetLoadError, DecodedImage};
pub use frame::{AnimationClock, FrameLoop, FrameParams, FrameTarget, LoopState, TickOutcome};
pub use hooks::{FrameObserver, NullObserver, TextureInfo};
pub use lens::{render_still, LensSample};
pub use glam::Vec2;
pub use pointer::{normalize_pointer, PointerState};
pub use surface::{SurfaceSizing, Viewport};
pub use types::{
    ColorSpaceMode, ParamsError, RendererConfig, ShaderParams, DEFAULT_MAX_DEVICE_PIXEL_RATIO,
    LENS_CENTER, SMOOTHING_FACTOR, TIME_STEP,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the lens window and blocks until it closes.
    ///
    /// Fails only if the window or GPU cannot be initialised. A background
    /// image that fails to load is reported through `observer` and leaves the
    /// window running without a texture.
    pub fn run<O: FrameObserver>(self, observer: O) -> Result<()> {
        window::run_window(self.config, observer)
    }
}
