use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::assets::{AssetLoadError, DecodedImage};
use crate::hooks::TextureInfo;
use crate::surface::Viewport;

use super::context::SurfaceColorSpace;

fn linear_clamp_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

pub(crate) fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// The background image on the GPU. Installed once, never replaced.
pub(crate) struct LensTexture {
    _texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
    pub info: TextureInfo,
}

impl LensTexture {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        image: &DecodedImage,
        color_space: SurfaceColorSpace,
    ) -> Result<Self, AssetLoadError> {
        let (width, height) = (image.width(), image.height());
        let limit = device.limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(AssetLoadError::TooLarge {
                path: image.path.clone(),
                width,
                height,
                limit,
            });
        }

        let format = match color_space {
            SurfaceColorSpace::Gamma => wgpu::TextureFormat::Rgba8Unorm,
            SurfaceColorSpace::Linear => wgpu::TextureFormat::Rgba8UnormSrgb,
        };
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("lens background texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            image.pixels.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_clamp_sampler(device, "lens background sampler");
        let bind_group = texture_bind_group(device, layout, &view, &sampler, "lens texture bind group");

        Ok(Self {
            _texture: texture,
            bind_group,
            info: TextureInfo {
                path: image.path.clone(),
                width,
                height,
            },
        })
    }
}

/// Offscreen color target at the capped drawable size, blitted to the swapchain.
pub(crate) struct ScaledTarget {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

impl ScaledTarget {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        size: Viewport,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scaled lens target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = linear_clamp_sampler(device, "scaled target sampler");
        let bind_group = texture_bind_group(device, layout, &view, &sampler, "scaled target bind group");
        Self {
            _texture: texture,
            view,
            bind_group,
        }
    }
}
