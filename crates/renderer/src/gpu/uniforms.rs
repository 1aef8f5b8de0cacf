use bytemuck::{Pod, Zeroable};

use crate::frame::FrameParams;
use crate::surface::Viewport;
use crate::types::{ShaderParams, LENS_CENTER};

/// CPU mirror of the `LensParams` std140 block in the lens fragment shader.
///
/// Two leading `vec2`s pack to 16 bytes and the four trailing floats fill the
/// second 16-byte row, so no explicit padding is needed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct LensUniforms {
    pub mouse: [f32; 2],
    pub resolution: [f32; 2],
    pub time: f32,
    pub lens_size: f32,
    pub bulge: f32,
    pub aberration_strength: f32,
}

impl LensUniforms {
    pub fn new(params: &ShaderParams, resolution: Viewport) -> Self {
        Self {
            mouse: LENS_CENTER.to_array(),
            resolution: resolution.as_resolution(),
            time: 0.0,
            lens_size: params.lens_size(),
            bulge: params.bulge(),
            aberration_strength: params.aberration_strength(),
        }
    }

    pub fn apply(&mut self, frame: &FrameParams) {
        self.mouse = frame.mouse.to_array();
        self.resolution = frame.resolution.as_resolution();
        self.time = frame.time as f32;
    }

    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}
