use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, trace};

use crate::assets::{AssetLoadError, DecodedImage};
use crate::frame::FrameParams;
use crate::hooks::TextureInfo;
use crate::surface::{SurfaceSizing, Viewport};
use crate::types::{ColorSpaceMode, ShaderParams};

use super::context::GpuContext;
use super::pipeline::{create_blit_pipeline, create_lens_pipeline, PipelineLayouts};
use super::texture::{LensTexture, ScaledTarget};
use super::uniforms::LensUniforms;

const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Every GPU resource the lens window presents with.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    lens_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: LensUniforms,
    texture: Option<LensTexture>,
    scaled_target: Option<ScaledTarget>,
    sizing: SurfaceSizing,
    frame_count: u64,
    frames_since_last_update: u32,
    last_stats_update: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        sizing: SurfaceSizing,
        params: &ShaderParams,
        color_space: ColorSpaceMode,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, sizing.window, color_space)?;
        let layouts = PipelineLayouts::new(&context.device);
        let lens_pipeline = create_lens_pipeline(&context.device, &layouts, context.surface_format);
        let blit_pipeline = create_blit_pipeline(&context.device, &layouts, context.surface_format);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lens uniform buffer"),
            size: LensUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lens uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let uniforms = LensUniforms::new(params, sizing.drawable);
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut state = Self {
            context,
            layouts,
            lens_pipeline,
            blit_pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            texture: None,
            scaled_target: None,
            sizing,
            frame_count: 0,
            frames_since_last_update: 0,
            last_stats_update: Instant::now(),
        };
        state.rebuild_scaled_target();
        Ok(state)
    }

    pub(crate) fn sizing(&self) -> SurfaceSizing {
        self.sizing
    }

    pub(crate) fn drawable(&self) -> Viewport {
        self.sizing.drawable
    }

    pub(crate) fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Applies a new window size. Zero-sized (minimized) windows are ignored.
    pub(crate) fn resize(&mut self, sizing: SurfaceSizing) {
        if sizing.is_empty() {
            return;
        }
        self.context.resize(sizing.window);
        self.sizing = sizing;
        self.rebuild_scaled_target();
        debug!(
            width = sizing.window.width,
            height = sizing.window.height,
            drawable_width = sizing.drawable.width,
            drawable_height = sizing.drawable.height,
            "surface resized"
        );
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn rebuild_scaled_target(&mut self) {
        self.scaled_target = self.sizing.is_scaled().then(|| {
            ScaledTarget::new(
                &self.context.device,
                &self.layouts.texture_layout,
                self.context.surface_format,
                self.sizing.drawable,
            )
        });
    }

    /// Uploads the decoded background. Later calls are ignored.
    pub(crate) fn install_texture(
        &mut self,
        image: &DecodedImage,
    ) -> Result<TextureInfo, AssetLoadError> {
        if let Some(existing) = &self.texture {
            debug!("lens texture already installed; ignoring second image");
            return Ok(existing.info.clone());
        }
        let texture = LensTexture::upload(
            &self.context.device,
            &self.context.queue,
            &self.layouts.texture_layout,
            image,
            self.context.color_space,
        )?;
        let info = texture.info.clone();
        self.texture = Some(texture);
        Ok(info)
    }

    pub(crate) fn push_params(&mut self, params: &FrameParams) {
        self.uniforms.apply(params);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    pub(crate) fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        self.record_stats();

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("lens encoder"),
                });

        match (&self.texture, &self.scaled_target) {
            (Some(texture), Some(scaled)) => {
                self.encode_lens(&mut encoder, &scaled.view, texture);
                encode_pass(
                    &mut encoder,
                    &view,
                    "blit pass",
                    Some((&self.blit_pipeline, &[&scaled.bind_group][..])),
                );
            }
            (Some(texture), None) => {
                self.encode_lens(&mut encoder, &view, texture);
            }
            (None, _) => {
                encode_pass(&mut encoder, &view, "clear pass", None);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn encode_lens(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        texture: &LensTexture,
    ) {
        encode_pass(
            encoder,
            view,
            "lens pass",
            Some((
                &self.lens_pipeline,
                &[&self.uniform_bind_group, &texture.bind_group][..],
            )),
        );
    }

    fn record_stats(&mut self) {
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_stats_update);
        if elapsed >= STATS_INTERVAL {
            let fps = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame_count = self.frame_count,
                time = self.uniforms.time,
                scaled = self.scaled_target.is_some(),
                textured = self.texture.is_some(),
                "render stats"
            );
            self.frames_since_last_update = 0;
            self.last_stats_update = now;
        }
        trace!(frame = self.frame_count, "rendering frame");
    }
}

/// Clears `view` to transparent and optionally draws one full-screen triangle.
fn encode_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &str,
    draw: Option<(&wgpu::RenderPipeline, &[&wgpu::BindGroup])>,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });

    if let Some((pipeline, bind_groups)) = draw {
        render_pass.set_pipeline(pipeline);
        for (index, bind_group) in bind_groups.iter().enumerate() {
            render_pass.set_bind_group(index as u32, *bind_group, &[]);
        }
        render_pass.draw(0..3, 0..1);
    }
}
