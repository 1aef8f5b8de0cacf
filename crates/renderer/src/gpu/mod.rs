//! GPU side of the lens window.
//!
//! - `context` owns the wgpu instance, device and surface and reconfigures the
//!   swapchain on resize.
//! - `pipeline` builds the lens and blit render pipelines over a shared
//!   full-screen triangle.
//! - `texture` uploads the background image and manages the capped-resolution
//!   offscreen target.
//! - `uniforms` mirrors the lens shader's uniform block.
//! - `state` ties them together behind `GpuState`, used by `window`.

mod context;
mod pipeline;
mod state;
mod texture;
mod uniforms;

pub(crate) use state::GpuState;
